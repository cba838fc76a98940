use crate::application::live_session::SessionSnapshot;
use crate::application::recommendations::{Recommendation, RecommendationService};
use crate::application::session_driver::{LiveSessionOrchestrator, SessionSettings};
use crate::application::statistics::{StatisticsService, StatisticsView};
use crate::domain::analytics::AnalyticsOptions;
use crate::domain::models::SessionSignal;
use crate::infrastructure::api_client::ReqwestDashboardApi;
use crate::infrastructure::config::{DashboardConfig, ensure_default_config, load_config};
use crate::infrastructure::credential_store::AccessTokenStore;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::mood_source::MoodSource;
use crate::infrastructure::recommendation_client::RecommendationSource;
use crate::infrastructure::track_source::TrackSource;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the dashboard screen talks to, wired against one backend.
pub struct Dashboard<S>
where
    S: TrackSource + MoodSource + RecommendationSource + 'static,
{
    config: DashboardConfig,
    token_store: Arc<dyn AccessTokenStore>,
    orchestrator: LiveSessionOrchestrator<S, S>,
    statistics: StatisticsService<S>,
    recommendations: RecommendationService<S>,
}

pub type HttpDashboard = Dashboard<ReqwestDashboardApi>;

pub fn bootstrap_dashboard(
    workspace_root: &Path,
    token_store: Arc<dyn AccessTokenStore>,
) -> Result<HttpDashboard, InfraError> {
    let config_dir = workspace_root.join("config");
    fs::create_dir_all(&config_dir)?;
    ensure_default_config(&config_dir)?;
    let config = load_config(&config_dir)?;

    let api = Arc::new(ReqwestDashboardApi::new(
        config.api_base_url()?,
        Arc::clone(&token_store),
    ));
    info!(workspace = %workspace_root.display(), api = %config.api_base_url, "dashboard bootstrapped");
    Dashboard::new(config, token_store, api)
}

impl<S> Dashboard<S>
where
    S: TrackSource + MoodSource + RecommendationSource + 'static,
{
    pub fn new(
        config: DashboardConfig,
        token_store: Arc<dyn AccessTokenStore>,
        backend: Arc<S>,
    ) -> Result<Self, InfraError> {
        config.validate()?;
        let options = AnalyticsOptions {
            timezone: config.timezone()?,
        };

        Ok(Self {
            orchestrator: LiveSessionOrchestrator::new(
                Arc::clone(&backend),
                Arc::clone(&backend),
                SessionSettings::from(&config.polling),
            ),
            statistics: StatisticsService::new(Arc::clone(&backend), options),
            recommendations: RecommendationService::new(backend, config.recommendations.limit),
            token_store,
            config,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &LiveSessionOrchestrator<S, S> {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut LiveSessionOrchestrator<S, S> {
        &mut self.orchestrator
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, InfraError> {
        self.orchestrator.snapshot()
    }

    /// Stores `token` and starts the live session.
    pub fn connect(&mut self, token: &str) -> Result<(), InfraError> {
        self.token_store.save_token(token)?;
        self.orchestrator.start()
    }

    /// Loads statistics for `window_days`, or the configured window.
    pub async fn load_statistics(&mut self, window_days: Option<u32>) -> Result<StatisticsView, InfraError> {
        let window_days = window_days.unwrap_or(self.config.statistics.window_days);
        match self.statistics.load(window_days).await {
            Ok(view) => Ok(view),
            Err(error) => {
                self.report("mood_statistics", &error);
                Err(error)
            }
        }
    }

    /// Recommends for the displayed mood and keeps the song on the session.
    pub async fn recommend(&mut self) -> Result<Recommendation, InfraError> {
        let mood = self.orchestrator.snapshot()?.state.current_mood;
        match self.recommendations.recommend(mood.as_ref()).await {
            Ok(recommendation) => {
                self.orchestrator
                    .set_recommended_track(recommendation.song().cloned())?;
                Ok(recommendation)
            }
            Err(error) => {
                self.report("recommendations", &error);
                Err(error)
            }
        }
    }

    /// Queues the current recommendation and clears it from the session;
    /// `Ok(None)` when nothing is recommended.
    pub async fn queue_recommended(&mut self) -> Result<Option<String>, InfraError> {
        let Some(song) = self.orchestrator.snapshot()?.state.recommended_track else {
            return Ok(None);
        };
        match self.recommendations.queue(&song).await {
            Ok(message) => {
                self.orchestrator.clear_recommended_track()?;
                Ok(Some(message))
            }
            Err(error) => {
                self.report("queue_song", &error);
                Err(error)
            }
        }
    }

    /// Stops polling, clears the session and forgets the token.
    pub fn logout(&mut self) -> Result<(), InfraError> {
        self.orchestrator.logout()?;
        self.token_store.delete_token()?;
        info!("logged out");
        Ok(())
    }

    /// Acts on a session signal. Returns `true` when the user was logged out.
    pub fn handle_signal(&mut self, signal: SessionSignal) -> Result<bool, InfraError> {
        match signal {
            SessionSignal::ReauthenticationRequired => {
                self.logout()?;
                Ok(true)
            }
            // Login stays; the user reconnects the music account and calls `connect`.
            SessionSignal::ReconnectRequired => Ok(false),
        }
    }

    fn report(&mut self, context: &str, error: &InfraError) {
        if let Err(lock_error) = self.orchestrator.report_failure(context, error) {
            warn!(context, error = %lock_error, "failed to record failure on session");
        }
    }
}
