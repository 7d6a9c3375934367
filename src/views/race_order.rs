//! Race summary ordering and grouping

use crate::model::{parse_minutes, RaceRegistration};
use std::cmp::Ordering;

/// Group key for registrations without a cluster
pub const NO_CLUSTER_LABEL: &str = "Без кластера";

/// Registrations sharing a cluster label, in sorted order
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationGroup {
    pub key: String,
    pub registrations: Vec<RaceRegistration>,
}

fn missing_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn folded(value: Option<&str>) -> String {
    value.unwrap_or_default().to_lowercase()
}

/// Ordering used by the race summary table.
///
/// Cluster start time (missing or unparseable last), cluster label,
/// stand order (missing last), stand label, client name. Text keys compare
/// case-insensitively.
pub fn compare_registrations(a: &RaceRegistration, b: &RaceRegistration) -> Ordering {
    missing_last(
        a.cluster_start().and_then(parse_minutes),
        b.cluster_start().and_then(parse_minutes),
    )
    .then_with(|| folded(a.cluster_name()).cmp(&folded(b.cluster_name())))
    .then_with(|| missing_last(a.stand_order(), b.stand_order()))
    .then_with(|| folded(a.stand_label()).cmp(&folded(b.stand_label())))
    .then_with(|| {
        folded(a.client_name.as_deref()).cmp(&folded(b.client_name.as_deref()))
    })
}

/// Stable sort of registrations for display
pub fn sort_registrations(registrations: &[RaceRegistration]) -> Vec<RaceRegistration> {
    let mut sorted = registrations.to_vec();
    sorted.sort_by(compare_registrations);
    sorted
}

/// Partition already-sorted rows by cluster label.
///
/// Rows keep their order inside a group; groups are ordered by key,
/// case-insensitively.
pub fn group_by_cluster(sorted: &[RaceRegistration]) -> Vec<RegistrationGroup> {
    let mut groups: Vec<RegistrationGroup> = Vec::new();

    for registration in sorted {
        let key = registration.cluster_name().unwrap_or(NO_CLUSTER_LABEL);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.registrations.push(registration.clone()),
            None => groups.push(RegistrationGroup {
                key: key.to_string(),
                registrations: vec![registration.clone()],
            }),
        }
    }

    groups.sort_by(|a, b| {
        a.key
            .to_lowercase()
            .cmp(&b.key.to_lowercase())
            .then_with(|| a.key.cmp(&b.key))
    });
    groups
}
