//! Data Transfer Objects
//!
//! Request and response bodies exchanged with the studio backend.
//! Field names are camelCase on the wire.

use crate::model::{CopyResult, RaceRegistration, Reservation, ReservationStatus, SessionKind, Slot};
use serde::{Deserialize, Serialize};

// ============================================
// SLOT DTOs
// ============================================

/// `PATCH /api/schedule/slots/{id}` body
///
/// All three fields are always sent; `null` clears.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotSettingsPatch {
    pub label: Option<String>,
    pub session_kind: SessionKind,
    pub instructor_id: Option<i64>,
}

// ============================================
// RESERVATION DTOs
// ============================================

/// `PATCH /api/schedule/reservations/{id}` body
///
/// `stand_id` is doubly optional: absent means "leave alone", `Some(None)`
/// serializes as `null` and unassigns.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stand_id: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap_reservation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReservationStatus>,
}

impl ReservationPatch {
    /// Move to a stand (or unassign with `None`), optionally swapping with
    /// the reservation currently holding it.
    pub fn move_to(stand_id: Option<i64>, swap_reservation_id: Option<i64>) -> Self {
        Self {
            stand_id: Some(stand_id),
            swap_reservation_id,
            ..Default::default()
        }
    }

    /// Book a client into the reservation, binding it to `stand_id` when given
    pub fn assign_client(client_id: i64, stand_id: Option<i64>) -> Self {
        Self {
            stand_id: stand_id.map(Some),
            client_id: Some(client_id),
            status: Some(ReservationStatus::Booked),
            ..Default::default()
        }
    }

    pub fn is_swap(&self) -> bool {
        self.swap_reservation_id.is_some()
    }
}

/// Response to a reservation patch
///
/// The backend returns whichever of these it touched; a full `slot` wins
/// over the individual reservations when present.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationUpdate {
    #[serde(default)]
    pub reservation: Option<Reservation>,
    #[serde(default)]
    pub swapped_reservation: Option<Reservation>,
    #[serde(default)]
    pub slot: Option<Slot>,
}

impl ReservationUpdate {
    /// Reservations returned individually
    pub fn reservations(&self) -> impl Iterator<Item = &Reservation> {
        self.reservation
            .iter()
            .chain(self.swapped_reservation.iter())
    }
}

// ============================================
// COPY DTOs
// ============================================

/// `POST /api/schedule/slots/{id}/copy` body
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CopyRequest {
    pub target_slot_ids: Vec<i64>,
}

/// Copy response: per-target results plus the slots the server rewrote
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CopyResponse {
    #[serde(default)]
    pub results: Vec<CopyResult>,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

// ============================================
// CLIENT DTOs
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Query parameters for `GET /api/clients`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientQuery {
    pub search: String,
    pub page: u32,
    pub sort: String,
    pub direction: SortDirection,
}

impl ClientQuery {
    /// First page of a name search, sorted by name ascending
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            page: 1,
            sort: "full_name".to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Encoded query string, without the leading `?`
    pub fn to_query_string(&self) -> String {
        format!(
            "search={}&page={}&sort={}&direction={}",
            urlencoding::encode(&self.search),
            self.page,
            urlencoding::encode(&self.sort),
            self.direction.as_str()
        )
    }
}

// ============================================
// RACE DTOs
// ============================================

/// `PATCH /api/races/{id}/registrations/{id}` body
///
/// Both fields are always sent; `bikeId: null` with `bringOwnBike: false`
/// removes the bike.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BikeAssignment {
    pub bike_id: Option<i64>,
    pub bring_own_bike: bool,
}

/// Updated registration as returned by the bike patch
pub type RegistrationUpdate = RaceRegistration;
