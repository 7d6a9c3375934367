//! Studio backend API
//!
//! Typed access to the REST backend the desk sits on top of.
//!
//! # Endpoints
//!
//! ## Schedule
//! - `GET /api/schedule/slots/:id` - Slot, reservations, stands, instructors
//! - `PATCH /api/schedule/slots/:id` - Label, session kind, instructor
//! - `PATCH /api/schedule/reservations/:id` - Move/swap or book a client
//! - `GET /api/schedule/slots/:id/copy-targets` - Future slots to copy into
//! - `POST /api/schedule/slots/:id/copy` - Copy seating to target slots
//! - `GET /api/schedule/week?start=` - Slots of one week
//!
//! ## Clients
//! - `GET /api/clients?search=&page=&sort=&direction=` - Paginated search
//!
//! ## Races
//! - `GET /api/races/:id/summary` - Race, registrations, bikes
//! - `PATCH /api/races/:id/registrations/:id` - Bike assignment
//!
//! Views depend on the [`StudioApi`] trait, not on the HTTP client, so they
//! can run against any backend implementation.

pub mod client;
pub mod dto;
pub mod error;

pub use client::{ClientConfig, HttpStudioApi};
pub use dto::{
    BikeAssignment, ClientQuery, CopyRequest, CopyResponse, RegistrationUpdate, ReservationPatch,
    ReservationUpdate, SlotSettingsPatch, SortDirection,
};
pub use error::{ApiError, ApiResult};

use crate::model::{
    ClientRow, CopyTarget, Page, RaceRegistration, RaceSummary, Slot, SlotDetail, WeekSchedule,
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Operations the desk needs from the studio backend
#[async_trait]
pub trait StudioApi: Send + Sync {
    /// Slot with reservations, stands and the instructor list
    async fn slot_detail(&self, slot_id: i64) -> ApiResult<SlotDetail>;

    /// Update label, session kind and instructor of a slot
    async fn update_slot(&self, slot_id: i64, patch: &SlotSettingsPatch) -> ApiResult<Slot>;

    /// Move, swap, unassign or book a reservation
    async fn patch_reservation(
        &self,
        reservation_id: i64,
        patch: &ReservationPatch,
    ) -> ApiResult<ReservationUpdate>;

    /// Future slots the seating of `slot_id` can be copied into
    async fn copy_targets(&self, slot_id: i64) -> ApiResult<Vec<CopyTarget>>;

    /// Copy the seating of `slot_id` into the requested slots
    async fn copy_slot(&self, slot_id: i64, request: &CopyRequest) -> ApiResult<CopyResponse>;

    /// Slots of the week starting at `week_start`
    async fn week(&self, week_start: NaiveDate) -> ApiResult<WeekSchedule>;

    /// Search the client directory
    async fn search_clients(&self, query: &ClientQuery) -> ApiResult<Page<ClientRow>>;

    /// Race with its registrations and bikes
    async fn race_summary(&self, race_id: i64) -> ApiResult<RaceSummary>;

    /// Change the bike of one race registration
    async fn assign_bike(
        &self,
        race_id: i64,
        registration_id: i64,
        assignment: &BikeAssignment,
    ) -> ApiResult<RaceRegistration>;
}
