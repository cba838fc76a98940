use crate::application::live_session::{LiveSession, PollDirective, SessionSnapshot};
use crate::domain::models::RecommendedSong;
use crate::infrastructure::config::PollingConfig;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::mood_source::MoodSource;
use crate::infrastructure::track_source::{RecentTracksRequest, TrackSource};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub poll_interval: Duration,
    pub tracks: RecentTracksRequest,
    pub mood_window_minutes: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for SessionSettings {
    fn from(config: &PollingConfig) -> Self {
        Self {
            poll_interval: config.interval(),
            tracks: RecentTracksRequest {
                limit: config.recent_track_limit,
                window_minutes: config.track_window_minutes,
                analyze_mood: config.analyze_mood,
            },
            mood_window_minutes: config.mood_window_minutes,
        }
    }
}

struct SessionSlot {
    /// Bumped on every start and cancel; results tagged with an older value are dropped.
    generation: u64,
    session: LiveSession,
}

struct SharedSession {
    slot: Mutex<SessionSlot>,
    revision: watch::Sender<u64>,
}

impl SharedSession {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SessionSlot>, InfraError> {
        self.slot
            .lock()
            .map_err(|error| InfraError::Lock(format!("session: {error}")))
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// Applies `step` only if `generation` is still current.
    fn apply<R>(&self, generation: u64, step: impl FnOnce(&mut LiveSession) -> R) -> Option<R> {
        let result = {
            let mut slot = match self.lock() {
                Ok(slot) => slot,
                Err(error) => {
                    error!(%error, "dropping session update");
                    return None;
                }
            };
            if slot.generation != generation {
                debug!(generation, current = slot.generation, "dropping stale session update");
                return None;
            }
            step(&mut slot.session)
        };
        self.notify();
        Some(result)
    }
}

/// Owns the live session and the single recurring poll task. Dropping the
/// orchestrator cancels the task; nothing it had in flight is applied.
pub struct LiveSessionOrchestrator<T, M>
where
    T: TrackSource + 'static,
    M: MoodSource + 'static,
{
    track_source: Arc<T>,
    mood_source: Arc<M>,
    settings: SessionSettings,
    shared: Arc<SharedSession>,
    task: Option<JoinHandle<()>>,
}

impl<T, M> LiveSessionOrchestrator<T, M>
where
    T: TrackSource + 'static,
    M: MoodSource + 'static,
{
    /// A poll interval below one millisecond is raised to one millisecond.
    pub fn new(track_source: Arc<T>, mood_source: Arc<M>, mut settings: SessionSettings) -> Self {
        if settings.poll_interval < MIN_POLL_INTERVAL {
            warn!(
                requested_ms = settings.poll_interval.as_millis() as u64,
                "poll interval too small; using 1ms"
            );
            settings.poll_interval = MIN_POLL_INTERVAL;
        }
        let (revision, _) = watch::channel(0);
        Self {
            track_source,
            mood_source,
            settings,
            shared: Arc::new(SharedSession {
                slot: Mutex::new(SessionSlot {
                    generation: 0,
                    session: LiveSession::new(),
                }),
                revision,
            }),
            task: None,
        }
    }

    /// Starts (or restarts) the session: initial fetch, then periodic polling
    /// while connected. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<(), InfraError> {
        self.cancel_task();
        let generation = {
            let mut slot = self.shared.lock()?;
            slot.generation += 1;
            slot.session.begin_connect();
            slot.generation
        };
        self.shared.notify();
        info!(generation, interval_ms = self.settings.poll_interval.as_millis() as u64, "starting live session");

        self.task = Some(tokio::spawn(run_session(
            Arc::clone(&self.track_source),
            Arc::clone(&self.mood_source),
            self.settings.clone(),
            Arc::clone(&self.shared),
            generation,
        )));
        Ok(())
    }

    /// Cancels polling and keeps whatever is currently displayed.
    pub fn stop(&mut self) {
        if self.task.is_some() {
            info!("stopping live session");
        }
        self.cancel_task();
    }

    /// Cancels polling and clears the session back to its initial state.
    pub fn logout(&mut self) -> Result<(), InfraError> {
        self.stop();
        self.shared.lock()?.session.reset();
        self.shared.notify();
        Ok(())
    }

    pub fn is_polling(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, InfraError> {
        Ok(self.shared.lock()?.session.snapshot())
    }

    /// Revision counter bumped after every applied state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    pub fn set_recommended_track(&self, song: Option<RecommendedSong>) -> Result<(), InfraError> {
        self.shared.lock()?.session.set_recommended_track(song);
        self.shared.notify();
        Ok(())
    }

    pub fn clear_recommended_track(&self) -> Result<(), InfraError> {
        self.set_recommended_track(None)
    }

    pub fn dismiss_error(&self) -> Result<(), InfraError> {
        self.shared.lock()?.session.dismiss_error();
        self.shared.notify();
        Ok(())
    }

    /// Classifies a failure raised outside the poll cycle and applies it.
    pub fn report_failure(&mut self, context: &str, error: &InfraError) -> Result<PollDirective, InfraError> {
        let directive = self.shared.lock()?.session.report_failure(context, error);
        self.shared.notify();
        if directive == PollDirective::Stop {
            self.cancel_task();
        }
        Ok(directive)
    }

    fn cancel_task(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        match self.shared.lock() {
            Ok(mut slot) => slot.generation += 1,
            Err(error) => error!(%error, "cancelling live session with poisoned state"),
        }
        task.abort();
    }
}

impl<T, M> Drop for LiveSessionOrchestrator<T, M>
where
    T: TrackSource + 'static,
    M: MoodSource + 'static,
{
    fn drop(&mut self) {
        self.cancel_task();
    }
}

async fn run_session<T, M>(
    track_source: Arc<T>,
    mood_source: Arc<M>,
    settings: SessionSettings,
    shared: Arc<SharedSession>,
    generation: u64,
) where
    T: TrackSource + 'static,
    M: MoodSource + 'static,
{
    let tracks = track_source.recent_tracks(settings.tracks).await;
    let mood = match tracks {
        Ok(_) => Some(mood_source.current_mood(settings.mood_window_minutes).await),
        Err(_) => None,
    };
    match shared.apply(generation, |session| session.apply_initial(tracks, mood)) {
        Some(PollDirective::Continue) => {}
        _ => return,
    }

    let mut ticker = interval_at(Instant::now() + settings.poll_interval, settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let (tracks, mood) = tokio::join!(
            track_source.recent_tracks(settings.tracks),
            mood_source.current_mood(settings.mood_window_minutes),
        );
        let track_count = tracks.as_ref().map_or(0, Vec::len);
        match shared.apply(generation, |session| session.apply_poll(tracks, mood)) {
            Some(PollDirective::Continue) => debug!(generation, track_count, "poll cycle applied"),
            Some(PollDirective::Stop) => {
                info!(generation, "live session polling stopped");
                return;
            }
            None => return,
        }
    }
}
