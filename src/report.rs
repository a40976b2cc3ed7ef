use std::fmt::Write;

use crate::models::DashboardData;

pub fn build_report(data: &DashboardData) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Recruitment Funnel Report");
    let _ = writeln!(
        output,
        "Window {} to {} ({} scheduled leads in scope)",
        data.start, data.end, data.kpis.total_scheduled
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Funnel");

    for stage in &data.funnel {
        let _ = writeln!(output, "- {}: {}", stage.stage, stage.count);
    }
    let _ = writeln!(
        output,
        "- Scheduling rate {:.1}% of conversations, closure rate {:.1}% of scheduled",
        data.kpis.scheduling_rate, data.kpis.closure_rate
    );
    let _ = writeln!(
        output,
        "- Average days to close: {:.1}",
        data.kpis.avg_days_to_close
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Evolution");

    if data.weekly.is_empty() {
        let _ = writeln!(output, "No activity recorded for this window.");
    } else {
        let _ = writeln!(output, "| Week of | Conversations | Scheduled | Hired |");
        let _ = writeln!(output, "| --- | --- | --- | --- |");
        for bucket in &data.weekly {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                bucket.week_start, bucket.active_conversations, bucket.scheduled, bucket.hired
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Closure Rate by Channel");

    if data.channels.is_empty() {
        let _ = writeln!(output, "No channels recorded for this window.");
    } else {
        for channel in &data.channels {
            let _ = writeln!(
                output,
                "- {}: {:.1}% ({}/{})",
                channel.channel, channel.closure_rate, channel.hired, channel.total
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Volume by Channel");

    if data.channel_volume.is_empty() {
        let _ = writeln!(output, "No channels recorded for this window.");
    } else {
        for volume in &data.channel_volume {
            let _ = writeln!(
                output,
                "- {}: {} scheduled, {} withdrawn",
                volume.channel, volume.scheduled, volume.withdrawn
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Gender Distribution");

    if data.genders.is_empty() {
        let _ = writeln!(output, "No leads in scope.");
    } else {
        for slice in &data.genders {
            let _ = writeln!(output, "- {}: {}", slice.gender, slice.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Closure by Employment Status");

    if data.statuses.is_empty() {
        let _ = writeln!(output, "No leads in scope.");
    } else {
        for status in &data.statuses {
            let _ = writeln!(
                output,
                "- {}: {} leads, {} hired ({:.1}%)",
                status.status, status.total, status.hired, status.hired_share
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Withdrawal Reasons");

    if data.withdrawal_reasons.is_empty() {
        let _ = writeln!(output, "No withdrawal reasons recorded.");
    } else {
        for reason in &data.withdrawal_reasons {
            let _ = writeln!(output, "- {}: {}", reason.reason, reason.count);
        }
    }

    let mut recent = data.pipeline.clone();
    recent.sort_by(|a, b| b.schedule_date.cmp(&a.schedule_date));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Recent Scheduled Leads");

    if recent.is_empty() {
        let _ = writeln!(output, "No leads in scope.");
    } else {
        for record in recent.iter().take(5) {
            let scheduled = record
                .schedule_date
                .map(|date| date.to_string())
                .unwrap_or_else(|| "undated".to_string());
            let outcome = if record.hired { "hired" } else { "open" };
            let _ = writeln!(
                output,
                "- {} ({}, {}) scheduled {}, {}",
                record.user, record.contact_channel, record.status, scheduled, outcome
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FunnelStage, KpiSummary};

    fn empty_data() -> DashboardData {
        let kpis = KpiSummary {
            total_conversations: 0,
            total_scheduled: 0,
            total_hired: 0,
            avg_days_to_close: 0.0,
            scheduling_rate: 0.0,
            closure_rate: 0.0,
        };
        DashboardData {
            start: chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: chrono::NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            funnel: vec![FunnelStage { stage: "Conversations", count: 0 }],
            kpis,
            daily: Vec::new(),
            daily_conversations: Vec::new(),
            daily_scheduled: Vec::new(),
            daily_hires: Vec::new(),
            weekly: Vec::new(),
            channels: Vec::new(),
            genders: Vec::new(),
            statuses: Vec::new(),
            channel_volume: Vec::new(),
            withdrawal_reasons: Vec::new(),
            pipeline: Vec::new(),
        }
    }

    #[test]
    fn empty_windows_still_render_every_section() {
        let report = build_report(&empty_data());
        for heading in [
            "## Funnel",
            "## Weekly Evolution",
            "## Closure Rate by Channel",
            "## Gender Distribution",
            "## Withdrawal Reasons",
            "## Most Recent Scheduled Leads",
        ] {
            assert!(report.contains(heading), "missing {heading}");
        }
        assert!(report.contains("No activity recorded for this window."));
    }
}
