use chrono::{
  DateTime,
  NaiveDate,
  NaiveDateTime,
  Utc
};
use chrono_tz::Tz;

use crate::task::TaskStatus;

pub const MILLIS_PER_DAY: f64 =
  86_400_000.0;

pub const UNKNOWN_DATE: &str =
  "Unknown date";

const NAIVE_FORMATS: [&str; 3] = [
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M"
];

/// Parses the timestamp shapes the
/// backend and older exports produce.
/// Values without an offset are UTC.
pub fn parse_api_datetime(
  raw: &str
) -> Option<DateTime<Utc>> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  let normalised =
    trimmed.replacen(' ', "T", 1);

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(
      &normalised
    )
  {
    return Some(dt.with_timezone(&Utc));
  }

  for fmt in NAIVE_FORMATS {
    if let Ok(naive) =
      NaiveDateTime::parse_from_str(
        &normalised,
        fmt
      )
    {
      return Some(naive.and_utc());
    }
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      trimmed, "%Y-%m-%d"
    )
  {
    return date
      .and_hms_opt(0, 0, 0)
      .map(|naive| naive.and_utc());
  }

  trimmed
    .parse::<i64>()
    .ok()
    .and_then(
      DateTime::from_timestamp_millis
    )
}

/// Fractional days from `from` to `to`;
/// negative when `to` is earlier.
pub fn days_between(
  from: DateTime<Utc>,
  to: DateTime<Utc>
) -> f64 {
  (to - from).num_milliseconds() as f64
    / MILLIS_PER_DAY
}

/// Whole days (rounded up) between
/// start and end, end defaulting to
/// `now`. Zero when never started.
pub fn calculate_duration(
  start: Option<DateTime<Utc>>,
  end: Option<DateTime<Utc>>,
  now: DateTime<Utc>
) -> i64 {
  let Some(start) = start else {
    return 0;
  };
  let end = end.unwrap_or(now);
  days_between(start, end)
    .abs()
    .ceil() as i64
}

pub fn format_duration(
  days: i64
) -> String {
  match days {
    | 0 => "Today".to_string(),
    | 1 => "1 day".to_string(),
    | n => format!("{n} days")
  }
}

/// Caption shown next to a task or
/// subtask once it has left Pending.
pub fn status_duration(
  status: TaskStatus,
  started_at: Option<DateTime<Utc>>,
  completed_at: Option<DateTime<Utc>>,
  now: DateTime<Utc>
) -> String {
  match (status, started_at, completed_at) {
    | (TaskStatus::Pending, _, _) => {
      String::new()
    }
    | (
      TaskStatus::InProgress,
      Some(started),
      _
    ) => {
      let days = calculate_duration(
        Some(started),
        None,
        now
      );
      format!(
        "Started {} ago",
        format_duration(days)
      )
    }
    | (
      TaskStatus::Completed,
      Some(started),
      Some(completed)
    ) => {
      let days = calculate_duration(
        Some(started),
        Some(completed),
        now
      );
      format!(
        "Completed in {}",
        format_duration(days)
      )
    }
    | _ => String::new()
  }
}

#[must_use]
pub fn format_day(
  dt: DateTime<Utc>,
  tz: &Tz
) -> String {
  dt.with_timezone(tz)
    .format("%b %-d, %Y")
    .to_string()
}

/// Formats a raw timestamp string for
/// display. Never fails: anything that
/// does not parse is "Unknown date".
pub fn format_date(
  raw: &str,
  tz: &Tz
) -> String {
  match parse_api_datetime(raw) {
    | Some(dt) => format_day(dt, tz),
    | None => {
      tracing::warn!(
        raw,
        "invalid date string"
      );
      UNKNOWN_DATE.to_string()
    }
  }
}

pub mod api_datetime {
  use chrono::{
    DateTime,
    Utc
  };
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  /// A timestamp as it arrives on the
  /// wire: text in one of the accepted
  /// shapes, or bare epoch millis.
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawTimestamp {
    Millis(i64),
    Text(String)
  }

  impl RawTimestamp {
    fn is_blank(&self) -> bool {
      matches!(
        self,
        RawTimestamp::Text(text)
          if text.trim().is_empty()
      )
    }

    fn resolve<E: serde::de::Error>(
      self
    ) -> Result<DateTime<Utc>, E> {
      match self {
        | RawTimestamp::Millis(ms) => {
          DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| {
              E::custom(format!(
                "timestamp out of range: {ms}"
              ))
            })
        }
        | RawTimestamp::Text(text) => {
          super::parse_api_datetime(&text)
            .ok_or_else(|| {
              E::custom(format!(
                "invalid timestamp: {text}"
              ))
            })
        }
      }
    }
  }

  pub fn serialize<S>(
    dt: &DateTime<Utc>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer
      .serialize_str(&dt.to_rfc3339())
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<DateTime<Utc>, D::Error>
  where
    D: Deserializer<'de>
  {
    RawTimestamp::deserialize(deserializer)?
      .resolve()
  }

  pub mod option {
    use chrono::{
      DateTime,
      Utc
    };
    use serde::{
      Deserialize,
      Deserializer,
      Serializer
    };

    use super::RawTimestamp;

    pub fn serialize<S>(
      dt: &Option<DateTime<Utc>>,
      serializer: S
    ) -> Result<S::Ok, S::Error>
    where
      S: Serializer
    {
      match dt {
        | Some(value) => {
          serializer.serialize_some(
            &value.to_rfc3339()
          )
        }
        | None => serializer.serialize_none()
      }
    }

    pub fn deserialize<'de, D>(
      deserializer: D
    ) -> Result<
      Option<DateTime<Utc>>,
      D::Error
    >
    where
      D: Deserializer<'de>
    {
      match Option::<RawTimestamp>::deserialize(
        deserializer
      )? {
        | None => Ok(None),
        | Some(raw) if raw.is_blank() => {
          Ok(None)
        }
        | Some(raw) => raw.resolve().map(Some)
      }
    }
  }
}
