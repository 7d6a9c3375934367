//! Race Summary View
//!
//! Registrations of one race, sorted for the start list and grouped by
//! start cluster, with a bike selector per row.

use super::race_order::{group_by_cluster, sort_registrations, RegistrationGroup, NO_CLUSTER_LABEL};
use super::{parse_route_id, Banner, ViewError};
use crate::api::{BikeAssignment, StudioApi};
use crate::cache::{CachedResponse, QueryKey, SharedCache};
use crate::model::{Bike, RaceRegistration, RaceSummary};
use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Selector value meaning "rider brings their own bike"
pub const OWN_BIKE_VALUE: &str = "own";

/// Value of the per-row bike selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BikeChoice {
    NoBike,
    OwnBike,
    Bike(i64),
}

impl BikeChoice {
    /// Parse a selector value: empty, `own`, or a bike id
    pub fn from_selector(value: &str) -> Result<Self, ViewError> {
        match value.trim() {
            "" => Ok(BikeChoice::NoBike),
            v if v.eq_ignore_ascii_case(OWN_BIKE_VALUE) => Ok(BikeChoice::OwnBike),
            v => v
                .parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .map(BikeChoice::Bike)
                .ok_or_else(|| ViewError::InvalidIdentifier(value.to_string())),
        }
    }

    /// Current choice of a registration
    pub fn of(registration: &RaceRegistration) -> Self {
        if registration.bring_own_bike {
            BikeChoice::OwnBike
        } else {
            registration
                .bike_id
                .map(BikeChoice::Bike)
                .unwrap_or(BikeChoice::NoBike)
        }
    }

    pub fn selector_value(&self) -> String {
        match self {
            BikeChoice::NoBike => String::new(),
            BikeChoice::OwnBike => OWN_BIKE_VALUE.to_string(),
            BikeChoice::Bike(id) => id.to_string(),
        }
    }

    pub fn to_assignment(&self) -> BikeAssignment {
        match self {
            BikeChoice::NoBike => BikeAssignment {
                bike_id: None,
                bring_own_bike: false,
            },
            BikeChoice::OwnBike => BikeAssignment {
                bike_id: None,
                bring_own_bike: true,
            },
            BikeChoice::Bike(id) => BikeAssignment {
                bike_id: Some(*id),
                bring_own_bike: false,
            },
        }
    }

    /// Text shown for the choice
    pub fn describe(&self, bikes: &[Bike]) -> String {
        match self {
            BikeChoice::NoBike => "-".to_string(),
            BikeChoice::OwnBike => "own bike".to_string(),
            BikeChoice::Bike(id) => bikes
                .iter()
                .find(|b| b.id == *id)
                .map(|b| match &b.size_label {
                    Some(size) => format!("{} ({})", b.title, size),
                    None => b.title.clone(),
                })
                .unwrap_or_else(|| format!("bike #{}", id)),
        }
    }
}

#[derive(Debug, Default)]
struct RaceState {
    banner: Option<Banner>,
    saving: HashSet<i64>,
}

/// Race-day start list
pub struct RaceSummaryView {
    api: Arc<dyn StudioApi>,
    cache: SharedCache,
    race_id: i64,
    state: RwLock<RaceState>,
}

impl RaceSummaryView {
    /// Open the view for a route parameter
    pub async fn open(
        api: Arc<dyn StudioApi>,
        cache: SharedCache,
        route_param: &str,
    ) -> Result<Self, ViewError> {
        let race_id = parse_route_id(route_param)?;
        let view = Self {
            api,
            cache,
            race_id,
            state: RwLock::new(RaceState::default()),
        };

        let cached = view
            .cache
            .read()
            .await
            .get_fresh(&QueryKey::RaceSummary(race_id))
            .is_some();
        if !cached {
            view.reload().await?;
        }
        Ok(view)
    }

    pub fn race_id(&self) -> i64 {
        self.race_id
    }

    pub async fn reload(&self) -> Result<RaceSummary, ViewError> {
        let summary = self.api.race_summary(self.race_id).await.map_err(|e| {
            tracing::warn!(race_id = self.race_id, error = %e, "Failed to load race");
            ViewError::LoadFailed(e.user_message("Could not load the race"))
        })?;

        tracing::info!(
            race_id = self.race_id,
            registrations = summary.registrations.len(),
            bikes = summary.bikes.len(),
            "Race summary loaded"
        );

        self.cache.write().await.insert(
            QueryKey::RaceSummary(self.race_id),
            CachedResponse::RaceSummary(summary.clone()),
        );
        Ok(summary)
    }

    pub async fn summary(&self) -> Result<RaceSummary, ViewError> {
        self.cache
            .read()
            .await
            .race_summary(self.race_id)
            .cloned()
            .ok_or_else(|| ViewError::Stale("Race is no longer loaded; reload the view".to_string()))
    }

    /// Registrations in start-list order
    pub async fn rows(&self) -> Result<Vec<RaceRegistration>, ViewError> {
        Ok(sort_registrations(&self.summary().await?.registrations))
    }

    /// Start list split by cluster
    pub async fn groups(&self) -> Result<Vec<RegistrationGroup>, ViewError> {
        Ok(group_by_cluster(&self.rows().await?))
    }

    /// `(value, label)` pairs for the bike selector
    pub async fn bike_options(&self) -> Result<Vec<(String, String)>, ViewError> {
        let summary = self.summary().await?;
        let mut options = vec![
            (BikeChoice::NoBike.selector_value(), "no bike".to_string()),
            (BikeChoice::OwnBike.selector_value(), "own bike".to_string()),
        ];
        options.extend(summary.bikes.iter().map(|bike| {
            let choice = BikeChoice::Bike(bike.id);
            (choice.selector_value(), choice.describe(&summary.bikes))
        }));
        Ok(options)
    }

    pub async fn banner(&self) -> Option<Banner> {
        self.state.read().await.banner.clone()
    }

    pub async fn is_saving(&self, registration_id: i64) -> bool {
        self.state.read().await.saving.contains(&registration_id)
    }

    /// Change the bike of a registration and merge the returned row
    pub async fn set_bike(
        &self,
        registration_id: i64,
        choice: BikeChoice,
    ) -> Result<RaceRegistration, ViewError> {
        let summary = self.summary().await?;
        if !summary.registrations.iter().any(|r| r.id == registration_id) {
            let message = format!(
                "Registration {} is not in this race anymore; reload the view",
                registration_id
            );
            self.state.write().await.banner = Some(Banner::error(message.clone()));
            return Err(ViewError::Stale(message));
        }
        if let BikeChoice::Bike(id) = choice {
            if summary.bike(id).is_none() {
                let message = format!("Bike {} is not available for this race", id);
                self.state.write().await.banner = Some(Banner::error(message.clone()));
                return Err(ViewError::Stale(message));
            }
        }

        let assignment = choice.to_assignment();

        self.state.write().await.saving.insert(registration_id);
        let result = self
            .api
            .assign_bike(self.race_id, registration_id, &assignment)
            .await;
        self.state.write().await.saving.remove(&registration_id);

        match result {
            Ok(registration) => {
                let merged = self.cache.write().await.merge_registration(&registration);
                if !merged {
                    tracing::debug!(
                        race_id = self.race_id,
                        registration_id,
                        "Returned registration not in cached summary"
                    );
                }
                tracing::info!(
                    race_id = self.race_id,
                    registration_id,
                    bike = %choice.selector_value(),
                    "Bike reassigned"
                );
                self.state.write().await.banner = None;
                Ok(registration)
            }
            Err(e) => {
                let message = e.user_message("Could not change the bike");
                tracing::warn!(registration_id, error = %e, "Bike change failed");
                self.state.write().await.banner = Some(Banner::error(message.clone()));
                Err(ViewError::Mutation(message))
            }
        }
    }
}

/// Write the sorted start list as CSV
pub fn write_csv<W: io::Write>(
    rows: &[RaceRegistration],
    bikes: &[Bike],
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["cluster", "start", "stand", "client", "bike", "status"])?;

    for row in rows {
        let bike = BikeChoice::of(row).describe(bikes);
        let status = row.status.to_string();
        csv_writer.write_record([
            row.cluster_name().unwrap_or(NO_CLUSTER_LABEL),
            row.cluster_start().unwrap_or(""),
            row.stand_label().unwrap_or(""),
            row.display_name().as_str(),
            bike.as_str(),
            status.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
