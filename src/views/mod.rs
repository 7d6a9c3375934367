//! Desk views
//!
//! Presentation-independent state of the two working screens:
//!
//! - [`seating`]: stand grid of one slot with drag/drop, search-and-assign,
//!   settings and copy-to-other-slots
//! - [`race_summary`]: registrations of one race, sorted and grouped by
//!   start cluster, with per-row bike reassignment
//!
//! A view owns its UI state (banner, pending flags, open panels) and reads
//! server data from the shared [`QueryCache`](crate::cache::QueryCache).

pub mod copy_filter;
pub mod race_order;
pub mod race_summary;
pub mod seating;

pub use copy_filter::CopyFilter;
pub use race_order::{group_by_cluster, sort_registrations, RegistrationGroup, NO_CLUSTER_LABEL};
pub use race_summary::{BikeChoice, RaceSummaryView};
pub use seating::{
    resolve_assignment_target, CopySummary, MoveOutcome, SeatingView, SettingsForm, StandTile,
};

use thiserror::Error;

/// Errors surfaced by the views
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// Route parameter is not a usable id; nothing was fetched
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Initial fetch failed; the view cannot render
    #[error("Failed to load: {0}")]
    LoadFailed(String),

    /// Operator lacks the admin role; nothing was sent
    #[error("Only administrators can {0}")]
    AdminRequired(&'static str),

    /// Local snapshot no longer matches what the operator acted on
    #[error("{0}")]
    Stale(String),

    /// An operator action reached the server and failed; the view stays usable
    #[error("{0}")]
    Mutation(String),
}

impl ViewError {
    /// Errors that replace the whole view with an error panel
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            ViewError::InvalidIdentifier(_) | ViewError::LoadFailed(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Notice,
}

/// Persistent message strip at the top of a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Notice,
            message: message.into(),
        }
    }
}

/// Parse a route parameter into an entity id.
///
/// Accepts anything that reads as a finite, positive, whole number.
pub fn parse_route_id(param: &str) -> Result<i64, ViewError> {
    let trimmed = param.trim();
    let invalid = || ViewError::InvalidIdentifier(param.to_string());

    if let Ok(id) = trimmed.parse::<i64>() {
        return if id > 0 { Ok(id) } else { Err(invalid()) };
    }

    let value: f64 = trimmed.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value.fract() != 0.0 || value < 1.0 || value > i64::MAX as f64 {
        return Err(invalid());
    }
    Ok(value as i64)
}
