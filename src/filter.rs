use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{HireOutcome, PipelineRecord, TrafficDay};

/// Inclusive date-only reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Include-sets for the three pipeline attributes. Membership semantics:
/// an empty set excludes every row for that attribute.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub statuses: HashSet<String>,
    pub genders: HashSet<String>,
    pub outcomes: HashSet<HireOutcome>,
}

impl CategoryFilter {
    /// The default selection: every category present in the given rows.
    pub fn all_present(records: &[PipelineRecord]) -> Self {
        let mut filter = Self::default();
        for record in records {
            if !record.status.is_empty() {
                filter.statuses.insert(record.status.clone());
            }
            if !record.gender.is_empty() {
                filter.genders.insert(record.gender.clone());
            }
            filter.outcomes.insert(HireOutcome::of(record.hired));
        }
        filter
    }

    pub fn matches(&self, record: &PipelineRecord) -> bool {
        self.statuses.contains(&record.status)
            && self.genders.contains(&record.gender)
            && self.outcomes.contains(&HireOutcome::of(record.hired))
    }
}

pub fn filter_traffic(days: &[TrafficDay], range: DateRange) -> Vec<TrafficDay> {
    days.iter()
        .filter(|day| range.contains(day.date))
        .cloned()
        .collect()
}

/// Date filter for pipeline rows. Undated rows always pass: a lead
/// without a schedule date is never silently dropped by the window.
pub fn filter_by_date(records: &[PipelineRecord], range: DateRange) -> Vec<PipelineRecord> {
    records
        .iter()
        .filter(|record| record.schedule_date.map_or(true, |date| range.contains(date)))
        .cloned()
        .collect()
}

pub fn apply_categories(
    records: &[PipelineRecord],
    categories: &CategoryFilter,
) -> Vec<PipelineRecord> {
    records
        .iter()
        .filter(|record| categories.matches(record))
        .cloned()
        .collect()
}
