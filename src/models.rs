use std::collections::BTreeMap;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

/// One calendar day of the combined series: traffic counts joined with
/// per-day pipeline aggregates. Exactly one record per date.
#[derive(Debug, Clone, Serialize)]
pub struct TrafficDay {
    pub date: NaiveDate,
    pub active_conversations: i64,
    pub scheduled: i64,
    pub conversion_rate: f64,
    pub status_counts: BTreeMap<String, i64>,
    pub channel_counts: BTreeMap<String, i64>,
}

impl TrafficDay {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            active_conversations: 0,
            scheduled: 0,
            conversion_rate: 0.0,
            status_counts: BTreeMap::new(),
            channel_counts: BTreeMap::new(),
        }
    }
}

/// One candidate-event from the pipeline log, cleaned to the canonical
/// schema. Invariants: a hired record carries no non-continuation reason;
/// a non-hired record carries no hire date and no days-to-close.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRecord {
    pub user: String,
    pub schedule_date: Option<NaiveDate>,
    pub status: String,
    pub contact_channel: String,
    pub profession: String,
    pub gender: String,
    pub hired: bool,
    pub hire_date: Option<NaiveDate>,
    pub non_continuation_reason: Option<String>,
    pub days_to_close: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
pub enum HireOutcome {
    Hired,
    NotHired,
}

impl HireOutcome {
    pub fn of(hired: bool) -> Self {
        if hired {
            Self::Hired
        } else {
            Self::NotHired
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyBucket {
    pub week_start: NaiveDate,
    pub active_conversations: i64,
    pub scheduled: i64,
    pub hired: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelSummary {
    pub channel: String,
    pub total: usize,
    pub hired: usize,
    pub closure_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenderCount {
    pub gender: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusBreakdown {
    pub status: String,
    pub total: usize,
    pub hired: usize,
    pub hired_share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelVolume {
    pub channel: String,
    pub scheduled: usize,
    pub withdrawn: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReasonCount {
    pub reason: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunnelStage {
    pub stage: &'static str,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KpiSummary {
    pub total_conversations: i64,
    pub total_scheduled: usize,
    pub total_hired: usize,
    pub avg_days_to_close: f64,
    pub scheduling_rate: f64,
    pub closure_rate: f64,
}

/// Everything one dashboard render consumes, derived fresh per run.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub kpis: KpiSummary,
    pub funnel: Vec<FunnelStage>,
    pub daily: Vec<TrafficDay>,
    pub daily_conversations: Vec<DailyCount>,
    pub daily_scheduled: Vec<DailyCount>,
    pub daily_hires: Vec<DailyCount>,
    pub weekly: Vec<WeeklyBucket>,
    pub channels: Vec<ChannelSummary>,
    pub genders: Vec<GenderCount>,
    pub statuses: Vec<StatusBreakdown>,
    pub channel_volume: Vec<ChannelVolume>,
    pub withdrawal_reasons: Vec<ReasonCount>,
    pub pipeline: Vec<PipelineRecord>,
}

/// Share of `numerator` in `denominator` as a percentage. Zero when the
/// denominator is zero, never NaN.
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}
