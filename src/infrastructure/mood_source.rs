use crate::domain::models::{MoodStatistics, MoodVector};
use crate::infrastructure::api_client::ReqwestDashboardApi;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;

/// Point-in-time and historical mood inferences.
#[async_trait]
pub trait MoodSource: Send + Sync {
    /// `Ok(None)` means the backend had no vector at all for the window.
    async fn current_mood(&self, window_minutes: u32) -> Result<Option<MoodVector>, InfraError>;

    async fn statistics(&self, window_days: u32) -> Result<MoodStatistics, InfraError>;
}

#[async_trait]
impl MoodSource for ReqwestDashboardApi {
    async fn current_mood(&self, window_minutes: u32) -> Result<Option<MoodVector>, InfraError> {
        let mut url = self.endpoint(&["mood", "current"])?;
        url.query_pairs_mut()
            .append_pair("minutes", &window_minutes.to_string());
        self.get_json(url, "current mood").await
    }

    async fn statistics(&self, window_days: u32) -> Result<MoodStatistics, InfraError> {
        let mut url = self.endpoint(&["mood", "statistics"])?;
        url.query_pairs_mut()
            .append_pair("days", &window_days.to_string());
        self.get_json(url, "mood statistics").await
    }
}
