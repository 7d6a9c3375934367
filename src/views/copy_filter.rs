//! Copy-target filter
//!
//! Narrows the candidate slots of the copy panel by weekday and by a
//! time-of-day window.

use crate::model::{parse_minutes, CopyTarget};
use chrono::Weekday;
use std::collections::HashSet;

/// Weekday multi-select plus a `HH:MM` start/end window
///
/// An empty weekday set matches every day. A bound that does not parse is
/// ignored; a target whose own time does not parse fails any set bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CopyFilter {
    pub weekdays: HashSet<Weekday>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl CopyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weekday(mut self, day: Weekday) -> Self {
        self.weekdays.insert(day);
        self
    }

    pub fn starting_from(mut self, start: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn ending_by(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Toggle a weekday in the multi-select
    pub fn toggle_weekday(&mut self, day: Weekday) {
        if !self.weekdays.remove(&day) {
            self.weekdays.insert(day);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.weekdays.is_empty() && self.start_minutes().is_none() && self.end_minutes().is_none()
    }

    fn start_minutes(&self) -> Option<u32> {
        self.start.as_deref().and_then(parse_minutes)
    }

    fn end_minutes(&self) -> Option<u32> {
        self.end.as_deref().and_then(parse_minutes)
    }

    pub fn matches(&self, target: &CopyTarget) -> bool {
        if !self.weekdays.is_empty() && !self.weekdays.contains(&target.weekday()) {
            return false;
        }

        if let Some(start) = self.start_minutes() {
            match parse_minutes(&target.start_time) {
                Some(target_start) if target_start >= start => {}
                _ => return false,
            }
        }

        if let Some(end) = self.end_minutes() {
            match parse_minutes(&target.end_time) {
                Some(target_end) if target_end <= end => {}
                _ => return false,
            }
        }

        true
    }

    /// Targets passing the filter, in their original order
    pub fn apply<'a>(&self, targets: &'a [CopyTarget]) -> Vec<&'a CopyTarget> {
        targets.iter().filter(|t| self.matches(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SessionKind;
    use chrono::NaiveDate;

    fn target(id: i64, date: (i32, u32, u32), start: &str, end: &str) -> CopyTarget {
        CopyTarget {
            id,
            session_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            label: None,
            session_kind: SessionKind::SelfService,
        }
    }

    #[test]
    fn test_start_bound_excludes_earlier_slot() {
        let filter = CopyFilter::new().starting_from("09:00");
        assert!(!filter.matches(&target(1, (2026, 10, 20), "08:00", "09:00")));
        assert!(filter.matches(&target(2, (2026, 10, 20), "09:00", "10:00")));
    }

    #[test]
    fn test_end_bound() {
        let filter = CopyFilter::new().ending_by("12:00");
        assert!(filter.matches(&target(1, (2026, 10, 20), "11:00", "12:00")));
        assert!(!filter.matches(&target(2, (2026, 10, 20), "11:30", "12:30")));
    }

    #[test]
    fn test_weekday_multi_select() {
        // 2026-10-19 is a Monday
        let targets = vec![
            target(1, (2026, 10, 19), "09:00", "10:00"),
            target(2, (2026, 10, 20), "09:00", "10:00"),
            target(3, (2026, 10, 21), "09:00", "10:00"),
        ];
        let mut filter = CopyFilter::new().weekday(Weekday::Mon).weekday(Weekday::Wed);
        let ids: Vec<i64> = filter.apply(&targets).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);

        filter.toggle_weekday(Weekday::Mon);
        let ids: Vec<i64> = filter.apply(&targets).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn test_unparseable_bounds_ignored() {
        let filter = CopyFilter::new().starting_from("").ending_by("late");
        assert!(filter.is_empty());
        assert!(filter.matches(&target(1, (2026, 10, 20), "06:00", "23:00")));
    }

    #[test]
    fn test_unparseable_target_time_fails_set_bound() {
        let filter = CopyFilter::new().starting_from("09:00");
        assert!(!filter.matches(&target(1, (2026, 10, 20), "tbd", "10:00")));
    }
}
