//! Mood dashboard core: chart aggregation for historical mood records and a
//! live listening session that polls recent tracks and the current mood.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::bootstrap::{Dashboard, HttpDashboard, bootstrap_dashboard};
pub use application::live_session::{LiveSession, PollDirective, SessionSnapshot, classify_failure};
pub use application::recommendations::{Recommendation, RecommendationService};
pub use application::session_driver::{LiveSessionOrchestrator, SessionSettings};
pub use application::statistics::{StatisticsService, StatisticsView};
pub use domain::analytics::{AnalyticsOptions, MoodAnalytics, aggregate_mood_records};
pub use domain::models::{
    ChartPoint, ChartSeries, Emotion, EmotionCount, ErrorInfo, FailureKind, MoodRecord,
    MoodStatistics, MoodVector, RecommendedSong, SessionPhase, SessionSignal, SessionState, Track,
};
pub use infrastructure::config::DashboardConfig;
pub use infrastructure::credential_store::{AccessTokenStore, InMemoryAccessTokenStore};
pub use infrastructure::error::InfraError;
