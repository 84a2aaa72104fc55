use chrono_tz::Tz;

use crate::config::Config;

/// Display timezone from
/// `display.timezone`, falling back to
/// UTC when unset or unknown.
pub fn display_timezone(cfg: &Config) -> Tz {
  cfg
    .get("display.timezone")
    .and_then(|raw| {
      parse_timezone(&raw, "display.timezone")
    })
    .unwrap_or(chrono_tz::UTC)
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "configured display timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id; using UTC"
      );
      None
    }
  }
}
