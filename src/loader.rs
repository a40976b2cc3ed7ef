use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{percentage, PipelineRecord, TrafficDay};

// Formats observed across the source exports, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y", "%d/%m/%Y"];

// Whole-value corrections applied after title-casing.
const ACRONYMS: &[(&str, &str)] = &[("Cta", "CTA"), ("Sdr", "SDR")];

const PLACEHOLDER: &str = "-";

#[derive(Debug, Deserialize)]
struct RawTrafficRow {
    date: String,
    #[serde(rename = "active conversations")]
    active_conversations: String,
}

#[derive(Debug, Deserialize)]
struct RawPipelineRow {
    user: String,
    #[serde(rename = "schedule date")]
    schedule_date: String,
    status: String,
    #[serde(rename = "contact channel")]
    contact_channel: String,
    profession: String,
    hired: String,
    #[serde(rename = "hire date")]
    hire_date: String,
    #[serde(rename = "non-continuation reason")]
    non_continuation_reason: String,
    #[serde(default)]
    gender: Option<String>,
}

/// Daily conversation counts keyed by date. A missing file degrades to an
/// empty series; a present file with the wrong schema is an error.
pub fn load_traffic(path: &Path) -> Result<BTreeMap<NaiveDate, i64>> {
    if !path.exists() {
        warn!(path = %path.display(), "traffic file not found, continuing with an empty series");
        return Ok(BTreeMap::new());
    }
    let file = File::open(path)
        .with_context(|| format!("failed to open traffic file: {}", path.display()))?;
    read_traffic(file).with_context(|| format!("failed to read traffic file: {}", path.display()))
}

/// Cleaned per-candidate pipeline table. Same degradation rules as
/// [`load_traffic`].
pub fn load_pipeline(path: &Path) -> Result<Vec<PipelineRecord>> {
    if !path.exists() {
        warn!(path = %path.display(), "pipeline file not found, continuing with an empty table");
        return Ok(Vec::new());
    }
    let file = File::open(path)
        .with_context(|| format!("failed to open pipeline file: {}", path.display()))?;
    read_pipeline(file).with_context(|| format!("failed to read pipeline file: {}", path.display()))
}

/// Outer-join of the traffic series with per-day pipeline aggregates.
/// Days present in only one source are zero-filled on the missing side.
pub fn combine_daily(
    traffic: &BTreeMap<NaiveDate, i64>,
    pipeline: &[PipelineRecord],
) -> Vec<TrafficDay> {
    let mut days: BTreeMap<NaiveDate, TrafficDay> = BTreeMap::new();

    for (&date, &count) in traffic {
        let day = days.entry(date).or_insert_with(|| TrafficDay::empty(date));
        day.active_conversations = count;
    }

    for record in pipeline {
        let Some(date) = record.schedule_date else {
            continue;
        };
        let day = days.entry(date).or_insert_with(|| TrafficDay::empty(date));
        day.scheduled += 1;
        if !record.status.is_empty() {
            *day.status_counts.entry(record.status.clone()).or_insert(0) += 1;
        }
        if !record.contact_channel.is_empty() {
            let counts = &mut day.channel_counts;
            *counts.entry(record.contact_channel.clone()).or_insert(0) += 1;
        }
    }

    for day in days.values_mut() {
        day.conversion_rate =
            percentage(day.scheduled as f64, day.active_conversations as f64);
    }

    days.into_values().collect()
}

fn read_traffic<R: Read>(reader: R) -> Result<BTreeMap<NaiveDate, i64>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut by_date: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut undated = 0usize;

    for (idx, row) in rdr.deserialize::<RawTrafficRow>().enumerate() {
        let row = row.with_context(|| format!("traffic row {} has an unexpected shape", idx + 2))?;
        let Some(date) = parse_date(&row.date) else {
            undated += 1;
            continue;
        };
        match parse_count(&row.active_conversations) {
            // Summing per date keeps the one-record-per-date invariant
            // even when the source repeats a day.
            Some(count) => *by_date.entry(date).or_insert(0) += count,
            None => {
                by_date.entry(date).or_insert(0);
            }
        }
    }

    if undated > 0 {
        warn!(rows = undated, "skipped traffic rows without a parseable date");
    }
    Ok(by_date)
}

fn read_pipeline<R: Read>(reader: R) -> Result<Vec<PipelineRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for (idx, row) in rdr.deserialize::<RawPipelineRow>().enumerate() {
        let row =
            row.with_context(|| format!("pipeline row {} has an unexpected shape", idx + 2))?;
        records.push(clean_row(row));
    }

    Ok(records)
}

fn clean_row(row: RawPipelineRow) -> PipelineRecord {
    let profession = row.profession.trim().to_string();
    let gender = match row.gender.as_deref().map(str::trim) {
        Some(provided) if !provided.is_empty() => normalize_category(provided),
        _ => infer_gender(&profession).to_string(),
    };

    let hired = parse_yes_no(&row.hired);
    let schedule_date = parse_date(&row.schedule_date);
    // A non-hired record has no meaningful hire date even if a stray
    // value made it into the export.
    let hire_date = if hired { parse_date(&row.hire_date) } else { None };
    let days_to_close = match (hire_date, schedule_date) {
        (Some(hire), Some(schedule)) => Some((hire - schedule).num_days()),
        _ => None,
    };

    let reason = row.non_continuation_reason.trim();
    let non_continuation_reason = if hired || reason.is_empty() || reason == PLACEHOLDER {
        None
    } else {
        Some(reason.to_string())
    };

    PipelineRecord {
        user: row.user.trim().to_string(),
        schedule_date,
        status: normalize_category(&row.status),
        contact_channel: normalize_category(&row.contact_channel),
        profession,
        gender,
        hired,
        hire_date,
        non_continuation_reason,
        days_to_close,
    }
}

/// Trim, collapse whitespace, title-case each word, then restore a small
/// set of canonical acronyms. Idempotent.
pub fn normalize_category(raw: &str) -> String {
    let titled = raw
        .split_whitespace()
        .map(title_word)
        .collect::<Vec<_>>()
        .join(" ");
    for (from, to) in ACRONYMS {
        if titled == *from {
            return (*to).to_string();
        }
    }
    titled
}

fn title_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

// Spanish professions ending in -a read as feminine; a handful of
// common-gender nouns are exempt.
fn infer_gender(profession: &str) -> &'static str {
    const COMMON_GENDER: &[&str] = &["analista", "periodista", "artista"];

    let lower = profession.trim().to_lowercase();
    let Some(first) = lower.split_whitespace().next() else {
        return "Desconocido";
    };
    if first.ends_with('a') && !COMMON_GENDER.contains(&first) {
        "Femenino"
    } else {
        "Masculino"
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == PLACEHOLDER {
        return None;
    }
    let parsed = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok());
    if parsed.is_none() {
        debug!(value = trimmed, "unparseable date cell treated as absent");
    }
    parsed
}

fn parse_count(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == PLACEHOLDER {
        return None;
    }
    match trimmed.parse::<i64>() {
        Ok(count) if count >= 0 => Some(count),
        _ => {
            debug!(value = trimmed, "unparseable count cell treated as absent");
            None
        }
    }
}

fn parse_yes_no(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "yes" | "y" | "si" | "sí" | "true" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn normalization_collapses_lexical_duplicates() {
        assert_eq!(normalize_category("  REFERIDO "), "Referido");
        assert_eq!(normalize_category("referido"), "Referido");
        assert_eq!(normalize_category("lead   magnet"), "Lead Magnet");
    }

    #[test]
    fn normalization_preserves_acronyms() {
        assert_eq!(normalize_category("cta"), "CTA");
        assert_eq!(normalize_category("SDR"), "SDR");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["REFERIDO", "cta", "Sdr", "lead magnet", "  Empleado ", ""] {
            let once = normalize_category(raw);
            assert_eq!(normalize_category(&once), once);
        }
    }

    #[test]
    fn dates_parse_across_source_formats() {
        assert_eq!(parse_date("2025-01-15"), Some(date(2025, 1, 15)));
        assert_eq!(parse_date("2025-01-15 00:00:00"), Some(date(2025, 1, 15)));
        assert_eq!(parse_date("1/15/2025"), Some(date(2025, 1, 15)));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("-"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn counts_reject_garbage_and_negatives() {
        assert_eq!(parse_count("12"), Some(12));
        assert_eq!(parse_count(" 0 "), Some(0));
        assert_eq!(parse_count("-"), None);
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count("many"), None);
    }

    #[test]
    fn gender_is_inferred_from_profession_when_missing() {
        assert_eq!(infer_gender("Enfermera"), "Femenino");
        assert_eq!(infer_gender("Ingeniero civil"), "Masculino");
        assert_eq!(infer_gender("Analista de datos"), "Masculino");
        assert_eq!(infer_gender(""), "Desconocido");
    }

    fn sample_row(hired: &str, hire_date: &str, reason: &str) -> RawPipelineRow {
        RawPipelineRow {
            user: "Ana Torres".to_string(),
            schedule_date: "2025-01-10".to_string(),
            status: "empleado".to_string(),
            contact_channel: "REFERIDO".to_string(),
            profession: "Enfermera".to_string(),
            hired: hired.to_string(),
            hire_date: hire_date.to_string(),
            non_continuation_reason: reason.to_string(),
            gender: None,
        }
    }

    #[test]
    fn cleaned_rows_honor_hired_invariants() {
        let hired = clean_row(sample_row("yes", "2025-01-20", "changed mind"));
        assert!(hired.hired);
        assert_eq!(hired.hire_date, Some(date(2025, 1, 20)));
        assert_eq!(hired.days_to_close, Some(10));
        assert_eq!(hired.non_continuation_reason, None);

        let not_hired = clean_row(sample_row("no", "2025-01-20", "too expensive"));
        assert!(!not_hired.hired);
        assert_eq!(not_hired.hire_date, None);
        assert_eq!(not_hired.days_to_close, None);
        assert_eq!(
            not_hired.non_continuation_reason.as_deref(),
            Some("too expensive")
        );

        let placeholder = clean_row(sample_row("no", "", "-"));
        assert_eq!(placeholder.non_continuation_reason, None);
    }

    #[test]
    fn cleaned_rows_normalize_categories() {
        let record = clean_row(sample_row("no", "", "-"));
        assert_eq!(record.status, "Empleado");
        assert_eq!(record.contact_channel, "Referido");
        assert_eq!(record.gender, "Femenino");
    }

    #[test]
    fn traffic_reader_sums_repeated_days_and_skips_undated_rows() {
        let csv = "date,active conversations\n\
                   2025-01-01,10\n\
                   2025-01-01,5\n\
                   garbage,7\n\
                   2025-01-02,-\n";
        let by_date = read_traffic(csv.as_bytes()).unwrap();
        assert_eq!(by_date.len(), 2);
        assert_eq!(by_date[&date(2025, 1, 1)], 15);
        assert_eq!(by_date[&date(2025, 1, 2)], 0);
    }

    #[test]
    fn traffic_reader_rejects_schema_mismatch() {
        let csv = "day,visitors\n2025-01-01,10\n";
        assert!(read_traffic(csv.as_bytes()).is_err());
    }

    #[test]
    fn pipeline_reader_accepts_optional_gender_column() {
        let csv = "user,schedule date,status,contact channel,profession,hired,hire date,non-continuation reason,gender\n\
                   Ana,2025-01-10,empleado,referido,Enfermera,no,,-,FEMENINO\n";
        let records = read_pipeline(csv.as_bytes()).unwrap();
        assert_eq!(records[0].gender, "Femenino");
    }

    #[test]
    fn missing_files_degrade_to_empty_results() {
        let path = Path::new("/nonexistent/traffic.csv");
        assert!(load_traffic(path).unwrap().is_empty());
        assert!(load_pipeline(path).unwrap().is_empty());
    }

    fn scheduled(date_str: &str) -> PipelineRecord {
        clean_row(RawPipelineRow {
            user: "Ana".to_string(),
            schedule_date: date_str.to_string(),
            status: "empleado".to_string(),
            contact_channel: "referido".to_string(),
            profession: "Enfermera".to_string(),
            hired: "no".to_string(),
            hire_date: String::new(),
            non_continuation_reason: PLACEHOLDER.to_string(),
            gender: None,
        })
    }

    #[test]
    fn combined_series_outer_joins_with_zero_fill() {
        let mut traffic = BTreeMap::new();
        traffic.insert(date(2025, 1, 1), 10);
        traffic.insert(date(2025, 1, 2), 20);
        let pipeline = vec![scheduled("2025-01-02"), scheduled("2025-01-03"), scheduled("")];

        let days = combine_daily(&traffic, &pipeline);
        assert_eq!(days.len(), 3);

        // Traffic-only day: zero scheduled, zero rate.
        assert_eq!(days[0].active_conversations, 10);
        assert_eq!(days[0].scheduled, 0);
        assert_eq!(days[0].conversion_rate, 0.0);

        assert_eq!(days[1].scheduled, 1);
        assert!((days[1].conversion_rate - 5.0).abs() < 1e-9);
        assert_eq!(days[1].status_counts["Empleado"], 1);
        assert_eq!(days[1].channel_counts["Referido"], 1);

        // Pipeline-only day: zero conversations, rate stays zero.
        assert_eq!(days[2].active_conversations, 0);
        assert_eq!(days[2].scheduled, 1);
        assert_eq!(days[2].conversion_rate, 0.0);
    }
}
