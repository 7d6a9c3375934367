//! # Velodesk
//!
//! Admin desk for a cycling studio: seating clients at the studio's fixed
//! stands, and race-day start lists with bike assignment. The desk is a
//! thin layer over the studio's REST backend, which owns all data.
//!
//! ## Modules
//!
//! - [`api`]: Typed client for the studio REST backend
//! - [`cache`]: Keyed query cache with update-by-id reconciliation
//! - [`views`]: Seating assignment and race summary view state
//! - [`dnd`]: Drag-and-drop transfers, independent of any browser
//! - [`model`]: Slots, reservations, stands, races, registrations
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use velodesk::api::{ClientConfig, HttpStudioApi};
//! use velodesk::cache::QueryCache;
//! use velodesk::dnd::{DragSession, DropTarget, TransferSurface};
//! use velodesk::session::Session;
//! use velodesk::views::SeatingView;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = Arc::new(HttpStudioApi::new(ClientConfig::default())?);
//!     let cache = QueryCache::shared();
//!
//!     let view = SeatingView::open(api, cache, Session::admin("masha"), "42").await?;
//!
//!     // Drag reservation 7 onto stand 3 (swaps if the stand is taken)
//!     let mut drag = DragSession::new();
//!     drag.begin_transfer(7);
//!     if let Some(transfer) = drag.complete_transfer(DropTarget::Stand(3)) {
//!         view.drop_transfer(transfer).await?;
//!     }
//!
//!     for tile in view.tiles().await? {
//!         println!("{}: {:?}", tile.stand.label(), tile.occupant.map(|r| r.display_name()));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod dnd;
pub mod model;
pub mod session;
pub mod views;

#[cfg(test)]
mod testing;

// Re-export top-level types for convenience
pub use api::{ApiError, ApiResult, ClientConfig, HttpStudioApi, StudioApi};

pub use cache::{CachedResponse, QueryCache, QueryKey, SharedCache};

pub use config::{Config, ConfigError, LoggingConfig};

pub use dnd::{DragSession, DropTarget, Transfer, TransferSurface};

pub use session::{Role, Session};

pub use views::{
    Banner, BannerKind, BikeChoice, CopyFilter, MoveOutcome, RaceSummaryView, SeatingView,
    SettingsForm, StandTile, ViewError,
};
