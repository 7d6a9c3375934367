//! Domain types
//!
//! Snapshot shapes returned by the studio backend. The desk never creates
//! or destroys these; it reads them on navigation and overwrites them with
//! whatever a mutation returns.
//!
//! - [`schedule`]: slots, reservations, stands, instructors, copy targets
//! - [`race`]: races, clusters, registrations, bikes
//! - [`clients`]: client search rows and the page envelope

pub mod clients;
pub mod race;
pub mod schedule;
mod time;

pub use clients::{ClientRow, Page};
pub use race::{Bike, Cluster, Race, RaceRegistration, RaceSummary, RegistrationStatus, StandRef};
pub use schedule::{
    CopyOutcome, CopyResult, CopyTarget, Instructor, Reservation, ReservationStatus,
    SessionKind, Slot, SlotDetail, Stand, StandBike, WeekSchedule,
};
pub use time::parse_minutes;
