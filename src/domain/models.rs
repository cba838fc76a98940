use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Relaxed,
}

impl Emotion {
    /// Declaration order doubles as the tie-break order for single-winner labels.
    pub const ALL: [Emotion; 4] = [Emotion::Happy, Emotion::Sad, Emotion::Angry, Emotion::Relaxed];

    pub fn label(self) -> &'static str {
        match self {
            Self::Happy => "Happy",
            Self::Sad => "Sad",
            Self::Angry => "Angry",
            Self::Relaxed => "Relaxed",
        }
    }

    pub fn intensity(self, mood: &MoodVector) -> f32 {
        match self {
            Self::Happy => mood.happy,
            Self::Sad => mood.sad,
            Self::Angry => mood.angry,
            Self::Relaxed => mood.relaxed,
        }
    }
}

/// Four emotion intensities, nominally in `[0, 1]`. They are not normalized and
/// may all be zero. Missing keys decode as zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MoodVector {
    pub happy: f32,
    pub sad: f32,
    pub angry: f32,
    pub relaxed: f32,
}

impl MoodVector {
    pub fn new(happy: f32, sad: f32, angry: f32, relaxed: f32) -> Self {
        Self {
            happy,
            sad,
            angry,
            relaxed,
        }
    }

    pub fn max_intensity(&self) -> f32 {
        Emotion::ALL
            .iter()
            .map(|emotion| emotion.intensity(self))
            .fold(0.0, f32::max)
    }

    pub fn has_signal(&self) -> bool {
        self.max_intensity() > 0.0
    }

    /// Strictly highest intensity; ties go to the first emotion in declaration order.
    pub fn dominant_emotion(&self) -> Option<Emotion> {
        let mut dominant = None;
        let mut max_score = 0.0_f32;
        for emotion in Emotion::ALL {
            let score = emotion.intensity(self);
            if score > max_score {
                max_score = score;
                dominant = Some(emotion);
            }
        }
        dominant
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoodRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(flatten)]
    pub mood: MoodVector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,
}

impl MoodRecord {
    pub fn new(mood: MoodVector, recorded_at: Option<&str>) -> Self {
        Self {
            id: None,
            user_id: None,
            mood,
            notes: None,
            recorded_at: recorded_at.map(ToOwned::to_owned),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoodStatistics {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub records: Vec<MoodRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendedSong {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// One x/y pair in the shape charting widgets consume (`{"name", "value"}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    #[serde(rename = "name")]
    pub label: String,
    pub value: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    #[serde(rename = "series")]
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, value: f32) {
        self.points.push(ChartPoint {
            label: label.into(),
            value,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Series sharing one x-axis domain.
pub type ChartSeriesGroup = Vec<ChartSeries>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmotionCount {
    #[serde(rename = "name")]
    pub emotion: Emotion,
    #[serde(rename = "value")]
    pub count: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Session-fatal: force full re-authentication.
    Unauthorized,
    /// Access revoked: clear the display and stop polling, keep the login.
    Forbidden,
    Transient,
}

impl FailureKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Transient => "transient",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: FailureKind,
    pub context: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    Connected,
    Degraded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionSignal {
    ReauthenticationRequired,
    ReconnectRequired,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    pub connected: bool,
    pub recent_tracks: Vec<Track>,
    pub current_mood: Option<MoodVector>,
    pub recommended_track: Option<RecommendedSong>,
    pub last_error: Option<ErrorInfo>,
}

impl SessionState {
    /// Drops everything shown for the session; `last_error` is left to the caller.
    pub fn clear_display(&mut self) {
        self.connected = false;
        self.recent_tracks.clear();
        self.current_mood = None;
        self.recommended_track = None;
    }
}
