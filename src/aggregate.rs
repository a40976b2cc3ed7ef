use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{
    percentage, ChannelSummary, ChannelVolume, DailyCount, GenderCount, PipelineRecord,
    ReasonCount, StatusBreakdown, TrafficDay, WeeklyBucket,
};

/// Conversations summed by date, ascending.
pub fn daily_conversations(days: &[TrafficDay]) -> Vec<DailyCount> {
    let mut by_date: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for day in days {
        *by_date.entry(day.date).or_insert(0) += day.active_conversations;
    }
    collect_counts(by_date)
}

/// Scheduled leads summed by date, ascending. Zero days are dropped:
/// a zero in the combined series is join fill, not an observation, and
/// the daily sequences carry no forced grid.
pub fn daily_scheduled(days: &[TrafficDay]) -> Vec<DailyCount> {
    let mut by_date: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for day in days {
        if day.scheduled > 0 {
            *by_date.entry(day.date).or_insert(0) += day.scheduled;
        }
    }
    collect_counts(by_date)
}

/// Hires counted by hire date, ascending. Only hired rows with a known
/// hire date contribute.
pub fn daily_hires(records: &[PipelineRecord]) -> Vec<DailyCount> {
    let mut by_date: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for record in records.iter().filter(|r| r.hired) {
        if let Some(date) = record.hire_date {
            *by_date.entry(date).or_insert(0) += 1;
        }
    }
    collect_counts(by_date)
}

fn collect_counts(by_date: BTreeMap<NaiveDate, i64>) -> Vec<DailyCount> {
    by_date
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

/// The Monday opening the week that contains `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Monday-anchored weekly buckets: conversations and scheduled summed
/// from the combined series, hires counted by hire date, outer-joined on
/// the bucket date. Gap weeks between observed buckets are zero-filled;
/// nothing is synthesized outside the observed span.
pub fn weekly_evolution(days: &[TrafficDay], records: &[PipelineRecord]) -> Vec<WeeklyBucket> {
    let mut traffic_weeks: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for day in days {
        let entry = traffic_weeks.entry(week_start(day.date)).or_insert((0, 0));
        entry.0 += day.active_conversations;
        entry.1 += day.scheduled;
    }

    let mut hire_weeks: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for record in records.iter().filter(|r| r.hired) {
        if let Some(date) = record.hire_date {
            *hire_weeks.entry(week_start(date)).or_insert(0) += 1;
        }
    }

    let Some(&first) = traffic_weeks.keys().chain(hire_weeks.keys()).min() else {
        return Vec::new();
    };
    let Some(&last) = traffic_weeks.keys().chain(hire_weeks.keys()).max() else {
        return Vec::new();
    };

    let mut buckets = Vec::new();
    let mut week = first;
    while week <= last {
        let (active_conversations, scheduled) =
            traffic_weeks.get(&week).copied().unwrap_or((0, 0));
        buckets.push(WeeklyBucket {
            week_start: week,
            active_conversations,
            scheduled,
            hired: hire_weeks.get(&week).copied().unwrap_or(0),
        });
        week += Duration::days(7);
    }
    buckets
}

/// Closure rate per contact channel, descending by rate. Rows without a
/// channel form no group.
pub fn channel_closure(records: &[PipelineRecord]) -> Vec<ChannelSummary> {
    let mut by_channel: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for record in records {
        if record.contact_channel.is_empty() {
            continue;
        }
        let entry = by_channel.entry(record.contact_channel.clone()).or_insert((0, 0));
        entry.0 += 1;
        if record.hired {
            entry.1 += 1;
        }
    }

    let mut summaries: Vec<ChannelSummary> = by_channel
        .into_iter()
        .map(|(channel, (total, hired))| ChannelSummary {
            channel,
            total,
            hired,
            closure_rate: percentage(hired as f64, total as f64),
        })
        .collect();
    summaries.sort_by(|a, b| {
        b.closure_rate
            .partial_cmp(&a.closure_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    summaries
}

pub fn gender_distribution(records: &[PipelineRecord]) -> Vec<GenderCount> {
    let mut by_gender: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        if record.gender.is_empty() {
            continue;
        }
        *by_gender.entry(record.gender.clone()).or_insert(0) += 1;
    }

    let mut counts: Vec<GenderCount> = by_gender
        .into_iter()
        .map(|(gender, count)| GenderCount { gender, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Hired share per employment status, descending by volume.
pub fn status_breakdown(records: &[PipelineRecord]) -> Vec<StatusBreakdown> {
    let mut by_status: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for record in records {
        if record.status.is_empty() {
            continue;
        }
        let entry = by_status.entry(record.status.clone()).or_insert((0, 0));
        entry.0 += 1;
        if record.hired {
            entry.1 += 1;
        }
    }

    let mut breakdowns: Vec<StatusBreakdown> = by_status
        .into_iter()
        .map(|(status, (total, hired))| StatusBreakdown {
            status,
            total,
            hired,
            hired_share: percentage(hired as f64, total as f64),
        })
        .collect();
    breakdowns.sort_by(|a, b| b.total.cmp(&a.total));
    breakdowns
}

/// Scheduled vs withdrawn volume per channel, descending by volume.
pub fn channel_volume(records: &[PipelineRecord]) -> Vec<ChannelVolume> {
    let mut by_channel: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for record in records {
        if record.contact_channel.is_empty() {
            continue;
        }
        let entry = by_channel.entry(record.contact_channel.clone()).or_insert((0, 0));
        entry.0 += 1;
        if !record.hired {
            entry.1 += 1;
        }
    }

    let mut volumes: Vec<ChannelVolume> = by_channel
        .into_iter()
        .map(|(channel, (scheduled, withdrawn))| ChannelVolume {
            channel,
            scheduled,
            withdrawn,
        })
        .collect();
    volumes.sort_by(|a, b| b.scheduled.cmp(&a.scheduled));
    volumes
}

/// Non-continuation reasons across non-hired rows, descending by count.
pub fn withdrawal_reasons(records: &[PipelineRecord]) -> Vec<ReasonCount> {
    let mut by_reason: BTreeMap<String, usize> = BTreeMap::new();
    for record in records.iter().filter(|r| !r.hired) {
        if let Some(reason) = &record.non_continuation_reason {
            *by_reason.entry(reason.clone()).or_insert(0) += 1;
        }
    }

    let mut counts: Vec<ReasonCount> = by_reason
        .into_iter()
        .map(|(reason, count)| ReasonCount { reason, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}
