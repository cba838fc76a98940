use crate::domain::models::Track;
use crate::infrastructure::api_client::ReqwestDashboardApi;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentTracksRequest {
    pub limit: u32,
    pub window_minutes: u32,
    pub analyze_mood: bool,
}

impl Default for RecentTracksRequest {
    fn default() -> Self {
        Self {
            limit: 10,
            window_minutes: 60,
            analyze_mood: true,
        }
    }
}

/// Recent listening activity for the signed-in account.
#[async_trait]
pub trait TrackSource: Send + Sync {
    async fn recent_tracks(&self, request: RecentTracksRequest) -> Result<Vec<Track>, InfraError>;
}

#[async_trait]
impl TrackSource for ReqwestDashboardApi {
    async fn recent_tracks(&self, request: RecentTracksRequest) -> Result<Vec<Track>, InfraError> {
        let mut url = self.endpoint(&["spotify", "recent-tracks"])?;
        url.query_pairs_mut()
            .append_pair("limit", &request.limit.to_string())
            .append_pair("time_limit_minutes", &request.window_minutes.to_string())
            .append_pair("analyze_mood", &request.analyze_mood.to_string());

        let tracks: Option<Vec<Track>> = self.get_json(url, "recent tracks").await?;
        Ok(tracks.unwrap_or_default())
    }
}
