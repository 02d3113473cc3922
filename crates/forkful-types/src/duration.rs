//! ISO-8601 durations for recipe cook and prep times.
//!
//! Text looks like `PT3H30M`, `PT45M`, `P1DT2H` or `PT1.5S`. Ingestion paths use the
//! lenient [`parse`], which never fails; user edits go through [`parse_strict`].

use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;
use tracing::warn;

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_MINUTE: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("duration is empty")]
    Empty,

    #[error("malformed duration '{0}'")]
    Malformed(String),

    #[error("duration '{0}' is negative")]
    Negative(String),

    #[error("duration '{0}' is out of range")]
    OutOfRange(String),
}

/// Lenient parse: empty or malformed text yields 0 seconds.
pub fn parse(text: &str) -> i64 {
    match parse_iso(text) {
        Ok(seconds) => seconds,
        Err(DurationError::Empty) => 0,
        Err(e) => {
            warn!("Falling back to zero seconds: {}", e);
            0
        }
    }
}

/// Strict parse for user-supplied times. Rejects empty, malformed and negative text.
pub fn parse_strict(text: &str) -> Result<i64, DurationError> {
    let seconds = parse_iso(text)?;
    if seconds < 0 {
        return Err(DurationError::Negative(text.to_string()));
    }
    Ok(seconds)
}

/// Canonical rendering: `PT` + hours + minutes + seconds, zero parts omitted.
pub fn render(seconds: i64) -> String {
    if seconds == 0 {
        return "PT0S".to_string();
    }

    let hours = seconds / SECS_PER_HOUR;
    let minutes = (seconds % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let secs = seconds % SECS_PER_MINUTE;

    let mut out = String::from("PT");
    if hours != 0 {
        out.push_str(&format!("{}H", hours));
    }
    if minutes != 0 {
        out.push_str(&format!("{}M", minutes));
    }
    if secs != 0 {
        out.push_str(&format!("{}S", secs));
    }
    out
}

/// Total of two times, or `None` when either side could not be parsed.
pub fn combine(a: &TimeField, b: &TimeField) -> Option<String> {
    if a.is_malformed() || b.is_malformed() {
        return None;
    }
    a.seconds().checked_add(b.seconds()).map(render)
}

fn parse_iso(text: &str) -> Result<i64, DurationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }

    let malformed = || DurationError::Malformed(text.to_string());
    let out_of_range = || DurationError::OutOfRange(text.to_string());

    let (negate, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let body = unsigned
        .strip_prefix(['P', 'p'])
        .ok_or_else(malformed)?;

    let (date_part, time_part) = match body.find(['T', 't']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };

    let mut total: i64 = 0;
    let mut seen_component = false;

    if !date_part.is_empty() {
        let days = date_part
            .strip_suffix(['D', 'd'])
            .ok_or_else(malformed)?;
        let days = parse_int(days).ok_or_else(malformed)?;
        total = days.checked_mul(SECS_PER_DAY).ok_or_else(out_of_range)?;
        seen_component = true;
    }

    if let Some(mut remaining) = time_part {
        if remaining.is_empty() {
            return Err(malformed());
        }
        // H, M, S must appear at most once each and in that order
        let mut last_rank = 0;
        while !remaining.is_empty() {
            let end = remaining
                .find(|c: char| c.is_ascii_alphabetic())
                .ok_or_else(malformed)?;
            let number = &remaining[..end];
            let unit = remaining[end..]
                .chars()
                .next()
                .ok_or_else(malformed)?
                .to_ascii_uppercase();

            let (rank, seconds) = match unit {
                'H' => (1, parse_int(number).and_then(|n| n.checked_mul(SECS_PER_HOUR))),
                'M' => (2, parse_int(number).and_then(|n| n.checked_mul(SECS_PER_MINUTE))),
                'S' => (3, parse_seconds(number)),
                _ => return Err(malformed()),
            };
            if rank <= last_rank {
                return Err(malformed());
            }
            last_rank = rank;

            let seconds = seconds.ok_or_else(malformed)?;
            total = total.checked_add(seconds).ok_or_else(out_of_range)?;
            seen_component = true;
            remaining = &remaining[end + unit.len_utf8()..];
        }
    }

    if !seen_component {
        return Err(malformed());
    }

    if negate {
        total.checked_neg().ok_or_else(out_of_range)
    } else {
        Ok(total)
    }
}

fn parse_int(number: &str) -> Option<i64> {
    let digits = number.trim_start_matches(['+', '-']);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    number.parse().ok()
}

/// Whole seconds, fractions floored.
fn parse_seconds(number: &str) -> Option<i64> {
    let Some((whole, fraction)) = number.split_once(['.', ',']) else {
        return parse_int(number);
    };
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole_secs = parse_int(whole)?;
    let has_fraction = fraction.bytes().any(|b| b != b'0');
    if whole.starts_with('-') && has_fraction {
        whole_secs.checked_sub(1)
    } else {
        Some(whole_secs)
    }
}

/// A recipe time stored as both text and seconds.
///
/// The text and seconds come from one value, so they can't disagree. Text that
/// failed to parse is kept as-is and reports zero seconds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeField(Repr);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Repr {
    #[default]
    Absent,
    Known {
        seconds: i64,
        text: String,
    },
    Malformed(String),
}

impl TimeField {
    pub fn absent() -> Self {
        Self(Repr::Absent)
    }

    /// Lenient constructor used for imported and stored text.
    pub fn from_text(text: Option<&str>) -> Self {
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return Self(Repr::Absent);
        };
        match parse_iso(text) {
            Ok(seconds) => Self(Repr::Known {
                seconds,
                text: text.to_string(),
            }),
            Err(e) => {
                warn!("Keeping unparseable time text: {}", e);
                Self(Repr::Malformed(text.to_string()))
            }
        }
    }

    pub fn parse_strict(text: &str) -> Result<Self, DurationError> {
        let seconds = parse_strict(text)?;
        Ok(Self(Repr::Known {
            seconds,
            text: text.to_string(),
        }))
    }

    /// Seconds, with absent and malformed text counting as zero.
    pub fn seconds(&self) -> i64 {
        match &self.0 {
            Repr::Known { seconds, .. } => *seconds,
            Repr::Absent | Repr::Malformed(_) => 0,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.0 {
            Repr::Absent => None,
            Repr::Known { text, .. } => Some(text),
            Repr::Malformed(text) => Some(text),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self.0, Repr::Absent)
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.0, Repr::Malformed(_))
    }
}

impl Serialize for TimeField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("TimeField", 2)?;
        s.serialize_field("text", &self.text())?;
        s.serialize_field("seconds", &self.seconds())?;
        s.end()
    }
}
