use crate::domain::models::{
    ChartSeries, ChartSeriesGroup, Emotion, EmotionCount, MoodRecord, MoodVector,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashSet;

pub const SENTIMENT_SERIES_NAME: &str = "Sentiment Score";
pub const UNKNOWN_DATE_LABEL: &str = "Unknown Date";

const DEDUP_BUCKET_MILLIS: i64 = 60_000;
const TIME_OF_DAY_FORMAT: &str = "%I:%M:%S %p";
const DATE_TIME_FORMAT: &str = "%b %-d, %I:%M %p";
const NAIVE_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy)]
pub struct AnalyticsOptions {
    /// Zone used to render labels and to decide whether records share a calendar day.
    pub timezone: Tz,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self { timezone: Tz::UTC }
    }
}

/// Chart-ready output of [`aggregate_mood_records`]. Every field is always
/// present; emptiness means "no data".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MoodAnalytics {
    pub sentiment: ChartSeriesGroup,
    pub dominant_counts: Vec<EmotionCount>,
    pub emotion_trends: ChartSeriesGroup,
}

impl MoodAnalytics {
    pub fn has_data(&self) -> bool {
        self.sentiment.iter().any(|series| !series.is_empty())
            || self.dominant_counts_enabled()
            || self.emotion_trends_enabled()
    }

    pub fn dominant_counts_enabled(&self) -> bool {
        self.dominant_counts.iter().any(|bucket| bucket.count > 0)
    }

    pub fn emotion_trends_enabled(&self) -> bool {
        self.emotion_trends.iter().any(|series| !series.is_empty())
    }

    /// Upper bound for the histogram's y-axis: one above the tallest bar, never below 1.
    pub fn dominant_axis_max(&self) -> u32 {
        self.dominant_counts
            .iter()
            .map(|bucket| bucket.count)
            .max()
            .filter(|max| *max > 0)
            .map_or(1, |max| max + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelStyle {
    TimeOfDay,
    DateTime,
}

struct TimedRecord<'a> {
    mood: &'a MoodVector,
    at: Option<DateTime<Utc>>,
}

/// Lenient ISO-8601 parsing. Offset-less timestamps are read in `timezone`;
/// anything unparsable yields `None` and is handled as "no timestamp".
pub fn parse_recorded_at(raw: &str, timezone: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    timezone
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Sentiment on `[0, 100]`, 50 being neutral. All four intensities are scaled
/// by 100 before being averaged into good and bad mood.
pub fn sentiment_score(mood: &MoodVector) -> f32 {
    let good_mood = (mood.happy * 100.0 + mood.relaxed * 100.0) / 2.0;
    let bad_mood = (mood.sad * 100.0 + mood.angry * 100.0) / 2.0;
    let balance = good_mood - bad_mood;
    (balance + 100.0) / 2.0
}

pub fn aggregate_mood_records(records: &[MoodRecord], options: &AnalyticsOptions) -> MoodAnalytics {
    if records.is_empty() {
        return MoodAnalytics::default();
    }

    let mut timed: Vec<TimedRecord<'_>> = records
        .iter()
        .map(|record| TimedRecord {
            mood: &record.mood,
            at: record
                .recorded_at
                .as_deref()
                .and_then(|raw| parse_recorded_at(raw, options.timezone)),
        })
        .collect();

    // Stable: untimed records keep their input order at position 0.
    timed.sort_by_key(|record| record.at.map_or(0, |at| at.timestamp_millis()));
    let kept = dedupe_by_minute(timed);
    let style = label_style(&kept, options.timezone);

    let mut sentiment = ChartSeries::new(SENTIMENT_SERIES_NAME);
    let mut trends: Vec<ChartSeries> = Emotion::ALL
        .iter()
        .map(|emotion| ChartSeries::new(emotion.label()))
        .collect();
    let mut counts = [0u32; 4];

    for record in &kept {
        let label = render_label(record.at, style, options.timezone);
        sentiment.push(label.clone(), sentiment_score(record.mood));

        for (series, emotion) in trends.iter_mut().zip(Emotion::ALL) {
            series.push(label.clone(), emotion.intensity(record.mood) * 100.0);
        }

        let max_score = record.mood.max_intensity();
        if max_score > 0.0 {
            for (count, emotion) in counts.iter_mut().zip(Emotion::ALL) {
                if emotion.intensity(record.mood) == max_score {
                    *count += 1;
                }
            }
        }
    }

    MoodAnalytics {
        sentiment: if sentiment.is_empty() {
            Vec::new()
        } else {
            vec![sentiment]
        },
        dominant_counts: Emotion::ALL
            .iter()
            .zip(counts)
            .map(|(emotion, count)| EmotionCount {
                emotion: *emotion,
                count,
            })
            .collect(),
        emotion_trends: trends.into_iter().filter(|series| !series.is_empty()).collect(),
    }
}

fn dedupe_by_minute(sorted: Vec<TimedRecord<'_>>) -> Vec<TimedRecord<'_>> {
    let mut seen_buckets = HashSet::new();
    sorted
        .into_iter()
        .filter(|record| match record.at {
            Some(at) => seen_buckets.insert(at.timestamp_millis().div_euclid(DEDUP_BUCKET_MILLIS)),
            None => true,
        })
        .collect()
}

fn label_style(records: &[TimedRecord<'_>], timezone: Tz) -> LabelStyle {
    let mut days = records
        .iter()
        .filter_map(|record| record.at)
        .map(|at| at.with_timezone(&timezone).date_naive());
    let Some(first_day) = days.next() else {
        return LabelStyle::TimeOfDay;
    };
    if days.all(|day| day == first_day) {
        LabelStyle::TimeOfDay
    } else {
        LabelStyle::DateTime
    }
}

fn render_label(at: Option<DateTime<Utc>>, style: LabelStyle, timezone: Tz) -> String {
    let Some(at) = at else {
        return UNKNOWN_DATE_LABEL.to_string();
    };
    let local = at.with_timezone(&timezone);
    match style {
        LabelStyle::TimeOfDay => local.format(TIME_OF_DAY_FORMAT).to_string(),
        LabelStyle::DateTime => local.format(DATE_TIME_FORMAT).to_string(),
    }
}
