//! Schedule types: slots, stands and the reservations that bind them

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of session a slot runs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Open ride, no instructor
    SelfService,
    /// Instructor-led class
    Instructor,
    /// Race-day block
    Race,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::SelfService => "self_service",
            SessionKind::Instructor => "instructor",
            SessionKind::Race => "race",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "self_service" | "self-service" | "self" => Ok(SessionKind::SelfService),
            "instructor" => Ok(SessionKind::Instructor),
            "race" => Ok(SessionKind::Race),
            other => Err(format!(
                "Invalid session kind: {}. Use self_service, instructor, or race",
                other
            )),
        }
    }
}

/// Reservation status vocabulary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Available,
    Booked,
    Cancelled,
    Pending,
    Waitlist,
    Blocked,
    Legacy,
    Hold,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Available => "available",
            ReservationStatus::Booked => "booked",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Pending => "pending",
            ReservationStatus::Waitlist => "waitlist",
            ReservationStatus::Blocked => "blocked",
            ReservationStatus::Legacy => "legacy",
            ReservationStatus::Hold => "hold",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Binding of a client (or nobody) to a slot and optionally a stand
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    pub slot_id: i64,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub stand_id: Option<i64>,
    pub status: ReservationStatus,
}

impl Reservation {
    /// Label shown on a reservation card
    pub fn display_name(&self) -> String {
        match (&self.client_name, self.client_id) {
            (Some(name), _) if !name.trim().is_empty() => name.clone(),
            (_, Some(id)) => format!("client #{}", id),
            _ => format!("free ({})", self.status),
        }
    }
}

/// Bike parked at a stand
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StandBike {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub min_height_cm: Option<u32>,
    #[serde(default)]
    pub max_height_cm: Option<u32>,
}

impl StandBike {
    /// Human-readable rider height range, if the bike has one
    pub fn height_range(&self) -> Option<String> {
        match (self.min_height_cm, self.max_height_cm) {
            (Some(min), Some(max)) => Some(format!("{}-{} cm", min, max)),
            (Some(min), None) => Some(format!("from {} cm", min)),
            (None, Some(max)) => Some(format!("up to {} cm", max)),
            (None, None) => None,
        }
    }
}

/// Fixed physical position in the studio
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stand {
    pub id: i64,
    pub code: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub bike: Option<StandBike>,
}

impl Stand {
    /// Display name, falling back to title, then code
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.title.as_deref().filter(|s| !s.trim().is_empty()))
            .unwrap_or(&self.code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instructor {
    pub id: i64,
    pub name: String,
}

/// Scheduled time window with its reservations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: i64,
    pub session_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub label: Option<String>,
    pub session_kind: SessionKind,
    #[serde(default)]
    pub instructor_id: Option<i64>,
    #[serde(default)]
    pub instructor_name: Option<String>,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

impl Slot {
    pub fn weekday(&self) -> Weekday {
        self.session_date.weekday()
    }

    /// Replace a reservation by id. Returns false when the slot does not hold it.
    pub fn replace_reservation(&mut self, reservation: &Reservation) -> bool {
        match self.reservations.iter_mut().find(|r| r.id == reservation.id) {
            Some(existing) => {
                *existing = reservation.clone();
                true
            }
            None => false,
        }
    }

    /// Short heading: date, time window and label
    pub fn heading(&self) -> String {
        let mut heading = format!(
            "{} {} {}-{}",
            self.session_date,
            self.weekday(),
            self.start_time,
            self.end_time
        );
        if let Some(label) = self.label.as_deref().filter(|l| !l.is_empty()) {
            heading.push_str(&format!(" \"{}\"", label));
        }
        heading
    }
}

/// Slot plus everything the seating grid needs to render it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotDetail {
    pub slot: Slot,
    #[serde(default)]
    pub stands: Vec<Stand>,
    #[serde(default)]
    pub instructors: Vec<Instructor>,
}

/// All slots of one week
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekSchedule {
    pub week_start: NaiveDate,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

impl WeekSchedule {
    /// Monday of the week containing `date`
    pub fn week_start_of(date: NaiveDate) -> NaiveDate {
        date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64)
    }
}

/// Future slot a seating layout can be copied to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CopyTarget {
    pub id: i64,
    pub session_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub label: Option<String>,
    pub session_kind: SessionKind,
}

impl CopyTarget {
    pub fn weekday(&self) -> Weekday {
        self.session_date.weekday()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CopyOutcome {
    Updated,
    Skipped,
    Failed,
}

/// Per-target result of a copy request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CopyResult {
    pub target_slot_id: i64,
    pub outcome: CopyOutcome,
    #[serde(default)]
    pub message: Option<String>,
}
