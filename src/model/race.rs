//! Race-day types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub id: i64,
    pub title: String,
    pub race_date: NaiveDate,
    #[serde(default)]
    pub location: Option<String>,
}

/// Start-time group of a race
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: i64,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
}

impl Cluster {
    /// Label, falling back to code. `None` when both are blank.
    pub fn name(&self) -> Option<&str> {
        self.label
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.code.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

/// Stand a registration is seated at
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StandRef {
    pub id: i64,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
}

impl StandRef {
    pub fn label(&self) -> Option<&str> {
        self.title
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.code.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RaceRegistration {
    pub id: i64,
    pub race_id: i64,
    pub client_id: i64,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub cluster: Option<Cluster>,
    #[serde(default)]
    pub stand: Option<StandRef>,
    #[serde(default)]
    pub bike_id: Option<i64>,
    #[serde(default)]
    pub bring_own_bike: bool,
    pub status: RegistrationStatus,
}

impl RaceRegistration {
    pub fn cluster_name(&self) -> Option<&str> {
        self.cluster.as_ref().and_then(Cluster::name)
    }

    pub fn cluster_start(&self) -> Option<&str> {
        self.cluster.as_ref().and_then(|c| c.start_time.as_deref())
    }

    pub fn stand_label(&self) -> Option<&str> {
        self.stand.as_ref().and_then(StandRef::label)
    }

    pub fn stand_order(&self) -> Option<i32> {
        self.stand.as_ref().and_then(|s| s.order)
    }

    pub fn display_name(&self) -> String {
        match self.client_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("client #{}", self.client_id),
        }
    }
}

/// Bike available for race-day assignment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bike {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub size_label: Option<String>,
    #[serde(default)]
    pub min_height_cm: Option<u32>,
    #[serde(default)]
    pub max_height_cm: Option<u32>,
}

/// Everything the race summary screen loads at once
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RaceSummary {
    pub race: Race,
    #[serde(default)]
    pub registrations: Vec<RaceRegistration>,
    #[serde(default)]
    pub bikes: Vec<Bike>,
}

impl RaceSummary {
    /// Replace a registration by id. Returns false when it is not in the list.
    pub fn replace_registration(&mut self, registration: &RaceRegistration) -> bool {
        match self
            .registrations
            .iter_mut()
            .find(|r| r.id == registration.id)
        {
            Some(existing) => {
                *existing = registration.clone();
                true
            }
            None => false,
        }
    }

    pub fn bike(&self, id: i64) -> Option<&Bike> {
        self.bikes.iter().find(|b| b.id == id)
    }
}
