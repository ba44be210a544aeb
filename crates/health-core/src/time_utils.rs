use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Layout used wherever a timestamp is shown to a person.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fractional-second digits kept in stored timestamps.
pub const STORED_SUBSEC_DIGITS: u16 = 6;

/// Naive layouts accepted when reading stores written without an offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

// ── Timezone resolution ───────────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Turn a configured timezone name into a [`Tz`].
///
/// `"auto"` resolves to the system timezone. Unknown names fall back to UTC
/// with a warning.
pub fn resolve_timezone(name: &str) -> Tz {
    let name = if name.eq_ignore_ascii_case("auto") {
        get_system_timezone()
    } else {
        name.to_string()
    };
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("unrecognised timezone \"{}\", falling back to UTC", name);
        Tz::UTC
    })
}

// ── Parsing / formatting ──────────────────────────────────────────────────────

/// Current time at the precision the stores keep, so a freshly created record
/// equals its reloaded copy.
pub fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(STORED_SUBSEC_DIGITS)
}

/// Parse a stored timestamp into UTC.
///
/// Accepts RFC 3339 (with `Z` or an explicit offset) and naive ISO-8601 forms
/// using either `T` or a space as separator. Naive values are read as local
/// time. Returns `None` for empty or unrecognised input.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| {
            Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| naive.and_utc())
        })
}

/// Render `dt` as `YYYY-MM-DD HH:MM:SS` in `tz`.
pub fn format_display(dt: &DateTime<Utc>, tz: &Tz) -> String {
    dt.with_timezone(tz).format(DISPLAY_FORMAT).to_string()
}

/// Serde adapter storing timestamps as RFC 3339 strings while accepting every
/// layout [`parse_timestamp`] understands.
pub mod iso8601 {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_rfc3339_utc() {
        let dt = parse_timestamp("2024-03-01T09:30:00Z").expect("parse");
        assert_eq!(dt.hour(), 9);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_timestamp("2024-03-01T09:30:00+02:00").expect("parse");
        assert_eq!(dt.hour(), 7);
    }

    #[test]
    fn test_parse_naive_space_separator_with_fraction() {
        assert!(parse_timestamp("2024-03-01 09:30:00.123456").is_some());
    }

    #[test]
    fn test_parse_naive_t_separator() {
        assert!(parse_timestamp("2024-03-01T09:30:00").is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_format_display_in_utc() {
        let dt = parse_timestamp("2024-03-01T09:30:05.999Z").unwrap();
        assert_eq!(format_display(&dt, &Tz::UTC), "2024-03-01 09:30:05");
    }

    #[test]
    fn test_format_display_in_named_zone() {
        let dt = parse_timestamp("2024-07-01T12:00:00Z").unwrap();
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        assert_eq!(format_display(&dt, &tz), "2024-07-01 14:00:00");
    }

    #[test]
    fn test_resolve_timezone_known_name() {
        assert_eq!(resolve_timezone("Asia/Tokyo"), chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn test_resolve_timezone_unknown_falls_back_to_utc() {
        assert_eq!(resolve_timezone("Mars/Olympus_Mons"), Tz::UTC);
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Stamped {
        #[serde(with = "iso8601")]
        at: DateTime<Utc>,
    }

    #[test]
    fn test_iso8601_writes_rfc3339() {
        let at = parse_timestamp("2024-03-01T09:30:00Z").unwrap();
        let json = serde_json::to_string(&Stamped { at }).unwrap();
        assert_eq!(json, r#"{"at":"2024-03-01T09:30:00.000000Z"}"#);
    }

    #[test]
    fn test_stored_now_survives_serialisation() {
        let at = stored_now();
        assert_eq!(at.timestamp_subsec_nanos() % 1_000, 0);

        let json = serde_json::to_string(&Stamped { at }).unwrap();
        let back: Stamped = serde_json::from_str(&json).unwrap();
        assert_eq!(back.at, at);
    }

    #[test]
    fn test_iso8601_rejects_invalid_string() {
        let result = serde_json::from_str::<Stamped>(r#"{"at":"not a time"}"#);
        assert!(result.is_err());
    }
}
