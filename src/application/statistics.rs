use crate::domain::analytics::{AnalyticsOptions, MoodAnalytics, aggregate_mood_records};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::mood_source::MoodSource;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsView {
    pub start_date: String,
    pub end_date: String,
    pub analytics: MoodAnalytics,
    /// Set when there is nothing to chart for the window.
    pub notice: Option<String>,
}

impl StatisticsView {
    pub fn has_data(&self) -> bool {
        self.analytics.has_data()
    }
}

pub struct StatisticsService<M>
where
    M: MoodSource,
{
    source: Arc<M>,
    options: AnalyticsOptions,
}

impl<M> StatisticsService<M>
where
    M: MoodSource,
{
    pub fn new(source: Arc<M>, options: AnalyticsOptions) -> Self {
        Self { source, options }
    }

    /// Fetches the window and aggregates it. Source failures are returned
    /// unchanged; callers route them through the session's classifier.
    pub async fn load(&self, window_days: u32) -> Result<StatisticsView, InfraError> {
        let statistics = self.source.statistics(window_days).await?;
        let record_count = statistics.records.len();
        let analytics = aggregate_mood_records(&statistics.records, &self.options);

        let notice = if record_count == 0 {
            Some(format!("No mood data available for {}.", describe_window(window_days)))
        } else if !analytics.has_data() {
            Some(format!(
                "No processable mood data available for {}.",
                describe_window(window_days)
            ))
        } else {
            None
        };
        debug!(
            window_days,
            record_count,
            sentiment_points = analytics.sentiment.iter().map(|series| series.points.len()).sum::<usize>(),
            "mood statistics aggregated"
        );

        Ok(StatisticsView {
            start_date: statistics.start_date,
            end_date: statistics.end_date,
            analytics,
            notice,
        })
    }
}

fn describe_window(window_days: u32) -> String {
    match window_days {
        1 => "the last day".to_string(),
        7 => "the last week".to_string(),
        days => format!("the last {days} days"),
    }
}
