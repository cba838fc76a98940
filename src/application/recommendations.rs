use crate::domain::models::{MoodVector, RecommendedSong};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::recommendation_client::{RecommendationCriteria, RecommendationSource};
use std::sync::Arc;
use tracing::{debug, info};

pub const NO_RECOMMENDATIONS_MESSAGE: &str = "No recommendations available at the moment.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    Song(RecommendedSong),
    /// The backend answered with an empty list.
    Unavailable(String),
}

impl Recommendation {
    pub fn song(&self) -> Option<&RecommendedSong> {
        match self {
            Self::Song(song) => Some(song),
            Self::Unavailable(_) => None,
        }
    }

    pub fn into_song(self) -> Option<RecommendedSong> {
        match self {
            Self::Song(song) => Some(song),
            Self::Unavailable(_) => None,
        }
    }
}

pub struct RecommendationService<R>
where
    R: RecommendationSource,
{
    source: Arc<R>,
    limit: u32,
}

impl<R> RecommendationService<R>
where
    R: RecommendationSource,
{
    pub fn new(source: Arc<R>, limit: u32) -> Self {
        Self {
            source,
            limit: limit.max(1),
        }
    }

    /// Asks for songs matching `mood`, or the backend's own current mood when
    /// nothing is displayed, and keeps the first one.
    pub async fn recommend(&self, mood: Option<&MoodVector>) -> Result<Recommendation, InfraError> {
        let criteria = RecommendationCriteria::for_mood(self.limit, mood);
        let songs = self.source.recommendations(&criteria).await?;
        debug!(
            count = songs.len(),
            use_current_mood = criteria.mood.is_none(),
            "recommendations received"
        );

        Ok(match songs.into_iter().next() {
            Some(song) => Recommendation::Song(song),
            None => Recommendation::Unavailable(NO_RECOMMENDATIONS_MESSAGE.to_string()),
        })
    }

    /// Adds `song` to the playback queue and returns the backend's acknowledgement.
    pub async fn queue(&self, song: &RecommendedSong) -> Result<String, InfraError> {
        let ack = self.source.queue_song(song).await?;
        info!(song_id = %song.id, "song queued");
        Ok(ack.message)
    }
}
