use crate::models::{percentage, DailyCount, FunnelStage, KpiSummary, PipelineRecord};

/// Headline totals and rates. `total_scheduled` is the filtered pipeline
/// row count rather than the daily-scheduled sum: attribute filters act
/// on individual leads, while the daily series only carries date filters.
pub fn calculate_kpis(
    pipeline: &[PipelineRecord],
    daily_conversations: &[DailyCount],
) -> KpiSummary {
    let total_conversations: i64 = daily_conversations.iter().map(|day| day.count).sum();
    let total_scheduled = pipeline.len();
    let total_hired = pipeline.iter().filter(|record| record.hired).count();

    let closed: Vec<i64> = pipeline
        .iter()
        .filter_map(|record| record.days_to_close)
        .collect();
    let avg_days_to_close = if closed.is_empty() {
        0.0
    } else {
        closed.iter().sum::<i64>() as f64 / closed.len() as f64
    };

    KpiSummary {
        total_conversations,
        total_scheduled,
        total_hired,
        avg_days_to_close,
        scheduling_rate: percentage(total_scheduled as f64, total_conversations as f64),
        closure_rate: percentage(total_hired as f64, total_scheduled as f64),
    }
}

pub fn funnel_stages(kpis: &KpiSummary) -> Vec<FunnelStage> {
    vec![
        FunnelStage {
            stage: "Conversations",
            count: kpis.total_conversations,
        },
        FunnelStage {
            stage: "Scheduled",
            count: kpis.total_scheduled as i64,
        },
        FunnelStage {
            stage: "Hired",
            count: kpis.total_hired as i64,
        },
    ]
}
