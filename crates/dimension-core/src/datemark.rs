//! Datemark: the mesh-wide logical timestamp
//!
//! TigerStyle: One canonical ordering primitive, one canonical wire form.
//!
//! A datemark is a microsecond-resolution UTC timestamp carried on the wire
//! as the fixed 20-byte string `YYYYMMDDHHMMSSffffff`. The string form sorts
//! the same way as the parsed form, so peers may use string comparison as a
//! coarse ordering check; authoritative ordering always uses the parsed
//! value. Gossip keepalives, death notices and the catalog version are all
//! datemarks.

use crate::constants::DATEMARK_LENGTH_BYTES;
use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Upper bound on the stored value: `99991231235959.999999` UTC in micros.
/// Keeps the calendar conversion in `format()` infallible.
const DATEMARK_MICROS_MAX: u64 = 253_402_300_799_999_999;

/// Microsecond-resolution logical timestamp with a fixed wire format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Datemark(u64);

impl Datemark {
    /// The Unix epoch, the smallest representable datemark
    pub const EPOCH: Datemark = Datemark(0);

    /// Create a datemark from microseconds since the Unix epoch
    ///
    /// Values beyond year 9999 are clamped so the wire form stays 20 bytes.
    pub fn from_micros(micros: u64) -> Self {
        Self(micros.min(DATEMARK_MICROS_MAX))
    }

    /// Create a datemark from milliseconds since the Unix epoch
    pub fn from_ms(ms: u64) -> Self {
        Self::from_micros(ms.saturating_mul(1_000))
    }

    /// Microseconds since the Unix epoch
    pub fn as_micros(&self) -> u64 {
        self.0
    }

    /// Milliseconds since the Unix epoch (truncating)
    pub fn as_ms(&self) -> u64 {
        self.0 / 1_000
    }

    /// Parse the fixed `YYYYMMDDHHMMSSffffff` wire form
    ///
    /// # Errors
    /// Returns `Error::InvalidDatemark` on wrong length, non-digit bytes or
    /// an impossible calendar date. Remote input is validated here and never
    /// reaches the membership or lock state machines malformed.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != DATEMARK_LENGTH_BYTES {
            return Err(Error::InvalidDatemark {
                value: s.to_string(),
                reason: format!(
                    "length {} != expected {}",
                    s.len(),
                    DATEMARK_LENGTH_BYTES
                ),
            });
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidDatemark {
                value: s.to_string(),
                reason: "contains non-digit characters".into(),
            });
        }

        // All-digit, fixed-width: slicing is safe
        let field = |range: std::ops::Range<usize>| -> u32 {
            s[range].parse::<u32>().unwrap_or(0)
        };

        let year = field(0..4) as i32;
        let month = field(4..6);
        let day = field(6..8);
        let hour = field(8..10);
        let minute = field(10..12);
        let second = field(12..14);
        let micros = field(14..20);

        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            Error::InvalidDatemark {
                value: s.to_string(),
                reason: "impossible calendar date".into(),
            }
        })?;
        let datetime = date
            .and_hms_micro_opt(hour, minute, second, micros)
            .ok_or_else(|| Error::InvalidDatemark {
                value: s.to_string(),
                reason: "impossible time of day".into(),
            })?;

        let epoch_micros = datetime.and_utc().timestamp_micros();
        if epoch_micros < 0 {
            return Err(Error::InvalidDatemark {
                value: s.to_string(),
                reason: "predates the Unix epoch".into(),
            });
        }

        Ok(Self(epoch_micros as u64))
    }

    /// Render the fixed 20-byte wire form
    pub fn format(&self) -> String {
        // Infallible: from_micros clamps to the representable range
        let dt: DateTime<Utc> = DateTime::from_timestamp_micros(self.0 as i64)
            .expect("datemark within clamped range");

        format!(
            "{:04}{:02}{:02}{:02}{:02}{:02}{:06}",
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
            dt.timestamp_subsec_micros()
        )
    }
}

impl fmt::Display for Datemark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

impl Serialize for Datemark {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for Datemark {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Datemark::parse(&s).map_err(de::Error::custom)
    }
}
