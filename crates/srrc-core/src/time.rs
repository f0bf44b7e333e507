use crate::error::{CoreError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Once;
use time::error::IndeterminateOffset;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// An instant rendered as RFC 3339 in UTC, e.g. `2024-11-07T19:00:00.123Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub OffsetDateTime);

impl Timestamp {
    pub fn new(datetime: OffsetDateTime) -> Self {
        Self(datetime)
    }

    pub fn format_rfc3339(&self) -> Result<String> {
        Ok(self.0.format(&Rfc3339)?)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self.format_rfc3339().map_err(|_| fmt::Error)?;
        write!(f, "{formatted}")
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = self.format_rfc3339().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}

pub fn now_utc() -> Timestamp {
    Timestamp(OffsetDateTime::now_utc())
}

/// Current wall-clock time in the local offset.
///
/// Falls back to UTC when the local offset cannot be determined, which is
/// the case on some platforms once the process is multi-threaded.
pub fn local_now() -> PrimitiveDateTime {
    wall_clock(OffsetDateTime::now_local(), OffsetDateTime::now_utc())
}

fn wall_clock(
    local: std::result::Result<OffsetDateTime, IndeterminateOffset>,
    utc: OffsetDateTime,
) -> PrimitiveDateTime {
    static FALLBACK_WARNING: Once = Once::new();

    let now = local.unwrap_or_else(|e| {
        FALLBACK_WARNING.call_once(|| {
            tracing::warn!(
                error = %e,
                "Local UTC offset unavailable, upcoming events are evaluated against UTC"
            );
        });
        utc
    });
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Parse an ISO-8601 date-time as a local (offset-less) value.
///
/// Accepts `YYYY-MM-DDTHH:MM`, with optional seconds and fraction, and an
/// optional trailing `Z` or `±HH:MM` that is ignored.
pub fn parse_local_date_time(value: &str) -> Result<PrimitiveDateTime> {
    let local = strip_offset(value.trim());

    PrimitiveDateTime::parse(
        local,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            local,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        )
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(
            local,
            format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        )
    })
    .map_err(|e| CoreError::invalid_date_time(format!("Failed to parse date-time '{value}': {e}")))
}

fn strip_offset(value: &str) -> &str {
    let Some(t_pos) = value.find('T') else {
        return value;
    };
    let time_part = &value[t_pos..];

    if let Some(stripped) = time_part.strip_suffix(['Z', 'z']) {
        return &value[..t_pos + stripped.len()];
    }

    match time_part.rfind(['+', '-']) {
        Some(sign) => &value[..t_pos + sign],
        None => value,
    }
}
