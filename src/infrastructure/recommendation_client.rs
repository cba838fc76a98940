use crate::domain::models::{MoodVector, RecommendedSong};
use crate::infrastructure::api_client::ReqwestDashboardApi;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationCriteria {
    pub limit: u32,
    /// `None` asks the backend to use its own view of the current mood.
    pub mood: Option<MoodVector>,
}

impl RecommendationCriteria {
    pub fn for_mood(limit: u32, mood: Option<&MoodVector>) -> Self {
        Self {
            limit,
            mood: mood.copied(),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("limit", self.limit.to_string()),
            ("use_current_mood", self.mood.is_none().to_string()),
        ];
        if let Some(mood) = &self.mood {
            pairs.extend([
                ("happy", mood.happy.to_string()),
                ("sad", mood.sad.to_string()),
                ("angry", mood.angry.to_string()),
                ("relaxed", mood.relaxed.to_string()),
            ]);
        }
        pairs
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct QueueAck {
    pub message: String,
}

#[async_trait]
pub trait RecommendationSource: Send + Sync {
    async fn recommendations(
        &self,
        criteria: &RecommendationCriteria,
    ) -> Result<Vec<RecommendedSong>, InfraError>;

    async fn queue_song(&self, song: &RecommendedSong) -> Result<QueueAck, InfraError>;
}

#[async_trait]
impl RecommendationSource for ReqwestDashboardApi {
    async fn recommendations(
        &self,
        criteria: &RecommendationCriteria,
    ) -> Result<Vec<RecommendedSong>, InfraError> {
        let mut url = self.endpoint(&["recommendations"])?;
        url.query_pairs_mut().extend_pairs(criteria.query_pairs());

        let songs: Option<Vec<RecommendedSong>> = self.get_json(url, "recommendations").await?;
        Ok(songs.unwrap_or_default())
    }

    async fn queue_song(&self, song: &RecommendedSong) -> Result<QueueAck, InfraError> {
        let url = self.endpoint(&["spotify", "queue-song"])?;
        self.post_json(url, song, "queue song").await
    }
}
