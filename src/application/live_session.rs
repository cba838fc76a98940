use crate::domain::models::{
    ErrorInfo, FailureKind, MoodVector, RecommendedSong, SessionPhase, SessionSignal, SessionState,
    Track,
};
use crate::infrastructure::error::InfraError;
use serde::Serialize;
use tracing::{error, info, warn};

pub const CONNECT_PROMPT_LABEL: &str = "Connect to see your mood";
pub const MOOD_NOT_AVAILABLE_LABEL: &str = "Mood data not available";
pub const MOOD_UNCLEAR_LABEL: &str = "Mood data unclear";
pub const MOOD_LOADING_LABEL: &str = "Loading mood...";

/// What the periodic task should do after a reconciliation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDirective {
    Continue,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub state: SessionState,
    pub mood_label: String,
    pub signal: Option<SessionSignal>,
}

/// Classifies a failure crossing into the session. Called exactly once per failure.
pub fn classify_failure(context: &str, error: &InfraError) -> ErrorInfo {
    let kind = error.failure_kind();
    let message = match (kind, error) {
        (FailureKind::Unauthorized, _) => format!(
            "Authentication error ({context}). Your session may have expired. Please log in again."
        ),
        (FailureKind::Forbidden, _) => format!(
            "Access denied or token expired ({context}). Please reconnect your music account."
        ),
        (FailureKind::Transient, InfraError::NoActiveDevice(_)) => {
            "Could not queue song: no active playback device found. Start playback on a device and try again."
                .to_string()
        }
        (FailureKind::Transient, error) => match error.detail() {
            Some(detail) => format!("Error ({context}): {detail}"),
            None => format!("An unexpected error occurred ({context}). Please try again."),
        },
    };

    ErrorInfo {
        kind,
        context: context.to_string(),
        message,
    }
}

/// Display label for a live mood reading: the single strongest emotion.
pub fn dominant_mood_label(mood: &MoodVector) -> &'static str {
    mood.dominant_emotion()
        .map_or(MOOD_UNCLEAR_LABEL, |emotion| emotion.label())
}

/// Connection state machine for one dashboard session. All mutation goes
/// through the `apply_*` steps; the async driver owns the timer.
#[derive(Debug, Clone)]
pub struct LiveSession {
    phase: SessionPhase,
    state: SessionState,
    mood_label: String,
    signal: Option<SessionSignal>,
}

impl Default for LiveSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveSession {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Disconnected,
            state: SessionState::default(),
            mood_label: CONNECT_PROMPT_LABEL.to_string(),
            signal: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mood_label(&self) -> &str {
        &self.mood_label
    }

    pub fn signal(&self) -> Option<SessionSignal> {
        self.signal
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            state: self.state.clone(),
            mood_label: self.mood_label.clone(),
            signal: self.signal,
        }
    }

    pub fn begin_connect(&mut self) {
        self.state = SessionState::default();
        self.phase = SessionPhase::Connecting;
        self.signal = None;
        self.mood_label = MOOD_LOADING_LABEL.to_string();
    }

    /// Applies the initial fetch. `mood` is only present when the track
    /// request succeeded.
    pub fn apply_initial(
        &mut self,
        tracks: Result<Vec<Track>, InfraError>,
        mood: Option<Result<Option<MoodVector>, InfraError>>,
    ) -> PollDirective {
        match tracks {
            Ok(tracks) => {
                self.phase = SessionPhase::Connected;
                self.state.connected = true;
                self.state.recent_tracks = tracks;
                self.state.last_error = None;
                info!(tracks = self.state.recent_tracks.len(), "live session connected");
            }
            Err(error) => {
                let failure = classify_failure("initial_recent_tracks", &error);
                match failure.kind {
                    FailureKind::Transient => {
                        warn!(context = %failure.context, %error, "initial fetch failed");
                        self.phase = SessionPhase::Disconnected;
                        self.state.clear_display();
                        self.state.last_error = Some(failure);
                        self.mood_label = CONNECT_PROMPT_LABEL.to_string();
                    }
                    _ => self.apply_session_failure(failure),
                }
                return PollDirective::Stop;
            }
        }

        match mood {
            Some(Ok(mood)) => self.update_mood_display(mood),
            Some(Err(error)) => {
                let failure = classify_failure("initial_current_mood", &error);
                self.apply_failures(vec![failure]);
            }
            None => self.update_mood_display(None),
        }
        self.directive()
    }

    /// Reconciles one poll cycle. Both results land in a single step; a failure
    /// on one side never discards the other side's success.
    pub fn apply_poll(
        &mut self,
        tracks: Result<Vec<Track>, InfraError>,
        mood: Result<Option<MoodVector>, InfraError>,
    ) -> PollDirective {
        if self.phase != SessionPhase::Connected {
            return PollDirective::Stop;
        }

        let mut failures = Vec::new();
        match tracks {
            Ok(tracks) if !tracks.is_empty() => self.state.recent_tracks = tracks,
            Ok(_) => {}
            Err(error) => failures.push(classify_failure("polling_recent_tracks", &error)),
        }
        match mood {
            Ok(mood) => self.update_mood_display(mood),
            Err(error) => failures.push(classify_failure("polling_current_mood", &error)),
        }

        self.apply_failures(failures);
        self.directive()
    }

    /// Routes a failure from a collaborator outside the poll cycle (statistics,
    /// recommendations) through the same classification.
    pub fn report_failure(&mut self, context: &str, error: &InfraError) -> PollDirective {
        let failure = classify_failure(context, error);
        self.apply_failures(vec![failure]);
        self.directive()
    }

    pub fn set_recommended_track(&mut self, song: Option<RecommendedSong>) {
        self.state.recommended_track = song;
    }

    pub fn dismiss_error(&mut self) {
        self.state.last_error = None;
    }

    /// Logout: back to the initial state with nothing displayed.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn directive(&self) -> PollDirective {
        if self.phase == SessionPhase::Connected {
            PollDirective::Continue
        } else {
            PollDirective::Stop
        }
    }

    fn apply_failures(&mut self, failures: Vec<ErrorInfo>) {
        let most_severe = failures
            .iter()
            .position(|failure| failure.kind == FailureKind::Unauthorized)
            .or_else(|| {
                failures
                    .iter()
                    .position(|failure| failure.kind == FailureKind::Forbidden)
            });

        if let Some(index) = most_severe {
            let failure = failures.into_iter().nth(index);
            if let Some(failure) = failure {
                self.apply_session_failure(failure);
            }
            return;
        }

        for failure in &failures {
            warn!(context = %failure.context, detail = %failure.message, "transient failure; keeping last good view");
        }
        if let Some(failure) = failures.into_iter().next() {
            self.state.last_error = Some(failure);
        }
    }

    fn apply_session_failure(&mut self, failure: ErrorInfo) {
        match failure.kind {
            FailureKind::Unauthorized => {
                error!(context = %failure.context, "session rejected; re-authentication required");
                self.phase = SessionPhase::Disconnected;
                self.signal = Some(SessionSignal::ReauthenticationRequired);
            }
            FailureKind::Forbidden => {
                warn!(context = %failure.context, "access revoked; polling suspended");
                self.phase = SessionPhase::Degraded;
                self.signal = Some(SessionSignal::ReconnectRequired);
            }
            FailureKind::Transient => {
                self.state.last_error = Some(failure);
                return;
            }
        }
        self.state.clear_display();
        self.state.last_error = Some(failure);
        self.mood_label = CONNECT_PROMPT_LABEL.to_string();
    }

    fn update_mood_display(&mut self, mood: Option<MoodVector>) {
        if !self.state.connected {
            self.mood_label = CONNECT_PROMPT_LABEL.to_string();
            return;
        }
        match mood {
            Some(mood) if mood.has_signal() => {
                self.mood_label = dominant_mood_label(&mood).to_string();
                self.state.current_mood = Some(mood);
            }
            // The prior reading stays in state; only the label falls back.
            Some(_) => self.mood_label = MOOD_UNCLEAR_LABEL.to_string(),
            None => self.mood_label = MOOD_NOT_AVAILABLE_LABEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            name: format!("Song {id}"),
            artist: "Artist".to_string(),
            album: None,
            uri: Some(format!("spotify:track:{id}")),
            title: None,
        }
    }

    fn song() -> RecommendedSong {
        RecommendedSong {
            id: "rec-1".to_string(),
            title: "Calm Down".to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            uri: "spotify:track:rec-1".to_string(),
            reason: None,
        }
    }

    fn connected_session() -> LiveSession {
        let mut session = LiveSession::new();
        session.begin_connect();
        let directive = session.apply_initial(
            Ok(vec![track("a")]),
            Some(Ok(Some(MoodVector::new(0.8, 0.1, 0.0, 0.2)))),
        );
        assert_eq!(directive, PollDirective::Continue);
        session.set_recommended_track(Some(song()));
        session
    }

    #[test]
    fn initial_success_connects_and_labels_mood() {
        let session = connected_session();
        assert_eq!(session.phase(), SessionPhase::Connected);
        assert!(session.state().connected);
        assert_eq!(session.state().recent_tracks, vec![track("a")]);
        assert_eq!(session.mood_label(), "Happy");
    }

    #[test]
    fn initial_transient_failure_stays_disconnected_without_signal() {
        let mut session = LiveSession::new();
        session.begin_connect();
        let directive =
            session.apply_initial(Err(InfraError::Network("connection refused".to_string())), None);

        assert_eq!(directive, PollDirective::Stop);
        assert_eq!(session.phase(), SessionPhase::Disconnected);
        assert!(!session.state().connected);
        assert_eq!(session.signal(), None);
        assert_eq!(session.mood_label(), CONNECT_PROMPT_LABEL);
        assert_eq!(
            session.state().last_error.as_ref().map(|error| error.kind),
            Some(FailureKind::Transient)
        );
    }

    #[test]
    fn initial_unauthorized_requests_reauthentication() {
        let mut session = LiveSession::new();
        session.begin_connect();
        let directive =
            session.apply_initial(Err(InfraError::Unauthorized("expired".to_string())), None);

        assert_eq!(directive, PollDirective::Stop);
        assert_eq!(session.phase(), SessionPhase::Disconnected);
        assert_eq!(session.signal(), Some(SessionSignal::ReauthenticationRequired));
    }

    #[test]
    fn initial_mood_forbidden_degrades_even_after_track_success() {
        let mut session = LiveSession::new();
        session.begin_connect();
        let directive = session.apply_initial(
            Ok(vec![track("a")]),
            Some(Err(InfraError::Forbidden("revoked".to_string()))),
        );

        assert_eq!(directive, PollDirective::Stop);
        assert_eq!(session.phase(), SessionPhase::Degraded);
        assert!(session.state().recent_tracks.is_empty());
    }

    #[test]
    fn unauthorized_poll_clears_state_and_stops() {
        let mut session = connected_session();
        let directive = session.apply_poll(
            Err(InfraError::Unauthorized("token expired".to_string())),
            Ok(Some(MoodVector::new(0.0, 0.9, 0.0, 0.0))),
        );

        assert_eq!(directive, PollDirective::Stop);
        assert_eq!(session.phase(), SessionPhase::Disconnected);
        assert!(!session.state().connected);
        assert!(session.state().recent_tracks.is_empty());
        assert!(session.state().current_mood.is_none());
        assert!(session.state().recommended_track.is_none());
        assert_eq!(session.signal(), Some(SessionSignal::ReauthenticationRequired));
        let error = session.state().last_error.clone().expect("error surfaced");
        assert_eq!(error.kind.code(), "unauthorized");
        assert_eq!(error.context, "polling_recent_tracks");
    }

    #[test]
    fn forbidden_poll_degrades_with_distinct_code() {
        let mut session = connected_session();
        let directive = session.apply_poll(
            Ok(vec![track("b")]),
            Err(InfraError::Forbidden("revoked".to_string())),
        );

        assert_eq!(directive, PollDirective::Stop);
        assert_eq!(session.phase(), SessionPhase::Degraded);
        assert!(session.state().recent_tracks.is_empty());
        assert!(session.state().current_mood.is_none());
        assert!(session.state().recommended_track.is_none());
        assert_eq!(session.signal(), Some(SessionSignal::ReconnectRequired));
        let error = session.state().last_error.clone().expect("error surfaced");
        assert_eq!(error.kind.code(), "forbidden");
        assert_eq!(session.mood_label(), CONNECT_PROMPT_LABEL);
    }

    #[test]
    fn unauthorized_wins_over_forbidden_in_same_cycle() {
        let mut session = connected_session();
        session.apply_poll(
            Err(InfraError::Forbidden("revoked".to_string())),
            Err(InfraError::Unauthorized("expired".to_string())),
        );
        assert_eq!(session.phase(), SessionPhase::Disconnected);
        assert_eq!(
            session.state().last_error.as_ref().map(|error| error.context.as_str()),
            Some("polling_current_mood")
        );
    }

    #[test]
    fn transient_poll_failure_keeps_prior_view() {
        let mut session = connected_session();
        let before = session.snapshot();
        let directive = session.apply_poll(
            Err(InfraError::Http {
                status: 503,
                detail: Some("maintenance".to_string()),
            }),
            Err(InfraError::Network("timed out".to_string())),
        );

        assert_eq!(directive, PollDirective::Continue);
        assert_eq!(session.phase(), SessionPhase::Connected);
        assert_eq!(session.state().recent_tracks, before.state.recent_tracks);
        assert_eq!(session.state().current_mood, before.state.current_mood);
        assert_eq!(session.mood_label(), before.mood_label);
        let error = session.state().last_error.clone().expect("inline message");
        assert_eq!(error.message, "Error (polling_recent_tracks): maintenance");

        session.dismiss_error();
        assert!(session.state().last_error.is_none());
    }

    #[test]
    fn track_success_survives_mood_failure() {
        let mut session = connected_session();
        let prior_mood = session.state().current_mood;
        session.apply_poll(
            Ok(vec![track("b"), track("c")]),
            Err(InfraError::Network("reset".to_string())),
        );

        assert_eq!(session.state().recent_tracks, vec![track("b"), track("c")]);
        assert_eq!(session.state().current_mood, prior_mood);
    }

    #[test]
    fn mood_success_survives_track_failure() {
        let mut session = connected_session();
        session.apply_poll(
            Err(InfraError::Network("reset".to_string())),
            Ok(Some(MoodVector::new(0.1, 0.2, 0.7, 0.0))),
        );

        assert_eq!(session.state().recent_tracks, vec![track("a")]);
        assert_eq!(session.mood_label(), "Angry");
    }

    #[test]
    fn empty_track_list_keeps_prior_tracks() {
        let mut session = connected_session();
        session.apply_poll(Ok(Vec::new()), Ok(None));
        assert_eq!(session.state().recent_tracks, vec![track("a")]);
    }

    #[test]
    fn unclear_or_missing_mood_keeps_prior_reading_with_fallback_label() {
        let mut session = connected_session();
        let prior_mood = session.state().current_mood;

        session.apply_poll(Ok(Vec::new()), Ok(Some(MoodVector::default())));
        assert_eq!(session.mood_label(), MOOD_UNCLEAR_LABEL);
        assert_eq!(session.state().current_mood, prior_mood);

        session.apply_poll(Ok(Vec::new()), Ok(None));
        assert_eq!(session.mood_label(), MOOD_NOT_AVAILABLE_LABEL);
        assert_eq!(session.state().current_mood, prior_mood);

        session.apply_poll(Ok(Vec::new()), Ok(Some(MoodVector::new(0.0, 0.6, 0.0, 0.0))));
        assert_eq!(session.mood_label(), "Sad");
    }

    #[test]
    fn fallback_labels_without_prior_reading() {
        let mut session = LiveSession::new();
        session.begin_connect();
        session.apply_initial(Ok(vec![track("a")]), Some(Ok(Some(MoodVector::default()))));
        assert_eq!(session.mood_label(), MOOD_UNCLEAR_LABEL);

        let mut session = LiveSession::new();
        session.begin_connect();
        session.apply_initial(Ok(vec![track("a")]), Some(Ok(None)));
        assert_eq!(session.mood_label(), MOOD_NOT_AVAILABLE_LABEL);

        assert_eq!(LiveSession::new().mood_label(), CONNECT_PROMPT_LABEL);
    }

    #[test]
    fn dominant_label_shows_single_winner_on_ties() {
        assert_eq!(dominant_mood_label(&MoodVector::new(0.5, 0.1, 0.1, 0.5)), "Happy");
        assert_eq!(dominant_mood_label(&MoodVector::new(0.1, 0.1, 0.6, 0.6)), "Angry");
        assert_eq!(dominant_mood_label(&MoodVector::default()), MOOD_UNCLEAR_LABEL);
    }

    #[test]
    fn poll_after_session_end_is_ignored() {
        let mut session = connected_session();
        session.apply_poll(Err(InfraError::Unauthorized("expired".to_string())), Ok(None));
        let directive = session.apply_poll(Ok(vec![track("z")]), Ok(None));
        assert_eq!(directive, PollDirective::Stop);
        assert!(session.state().recent_tracks.is_empty());
    }

    #[test]
    fn reported_failures_use_same_classifier() {
        let mut session = connected_session();
        let directive = session.report_failure(
            "queue_song",
            &InfraError::NoActiveDevice("Spotify active device not found".to_string()),
        );
        assert_eq!(directive, PollDirective::Continue);
        assert!(session.state().last_error.as_ref().is_some_and(|error| {
            error.message.contains("no active playback device")
        }));

        let directive =
            session.report_failure("recommendations", &InfraError::Forbidden("revoked".to_string()));
        assert_eq!(directive, PollDirective::Stop);
        assert_eq!(session.phase(), SessionPhase::Degraded);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut session = connected_session();
        session.reset();
        assert_eq!(session.snapshot(), LiveSession::new().snapshot());
    }

    #[test]
    fn classify_failure_without_detail_uses_generic_message() {
        let info = classify_failure("mood", &InfraError::Network("dns".to_string()));
        assert_eq!(info.kind, FailureKind::Transient);
        assert_eq!(info.message, "An unexpected error occurred (mood). Please try again.");
    }
}
