use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use taskdeck_shared::dashboard::{
  DashboardSettings,
  TimeWindow
};
use taskdeck_shared::endpoints::{
  ApiRoots,
  DEFAULT_API_BASE
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

const CONFIG_ENV_VAR: &str =
  "TASKDECK_CONFIG";
const API_URL_ENV_VAR: &str =
  "TASKDECK_API_URL";
const TIMEZONE_ENV_VAR: &str =
  "TASKDECK_TIMEZONE";

const DEFAULTS: [(&str, &str); 8] = [
  ("api.base_url", DEFAULT_API_BASE),
  ("api.timeout_secs", "30"),
  ("page.default", "Home"),
  ("color", "on"),
  ("display.timezone", "UTC"),
  ("dashboard.weekly_goal", "10"),
  ("dashboard.monthly_goal", "40"),
  ("dashboard.window", "week")
];

/// Flat dotted-key settings. Later
/// sources overwrite earlier ones:
/// defaults, file, environment, then
/// command-line overrides.
#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      map:          DEFAULTS
        .iter()
        .map(|(k, v)| {
          (k.to_string(), v.to_string())
        })
        .collect(),
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    Self::load_with_env(
      config_override,
      |name| std::env::var(name).ok()
    )
  }

  /// Like `load`, reading environment
  /// variables through `env`.
  pub fn load_with_env<F>(
    config_override: Option<&Path>,
    env: F
  ) -> anyhow::Result<Self>
  where
    F: Fn(&str) -> Option<String>
  {
    let mut cfg = Config::default();

    match resolve_config_path(
      config_override,
      &env
    ) {
      | Some(path) if path.exists() => {
        info!(config = %path.display(), "loading config file");
        cfg.load_file(&path)?;
      }
      | Some(path)
        if config_override.is_some() =>
      {
        return Err(anyhow!(
          "config file {} does not exist",
          path.display()
        ));
      }
      | Some(path) => {
        debug!(
          config = %path.display(),
          "no config file; using defaults"
        );
      }
      | None => {
        warn!(
          "no config directory; using \
           defaults"
        );
      }
    }

    cfg.apply_env(&env);
    Ok(cfg)
  }

  fn apply_env<F>(&mut self, env: &F)
  where
    F: Fn(&str) -> Option<String>
  {
    let pairs = [
      (API_URL_ENV_VAR, "api.base_url"),
      (TIMEZONE_ENV_VAR, "display.timezone")
    ];
    for (var, key) in pairs {
      if let Some(value) = env(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
      {
        debug!(var, key, value = %value, "environment override");
        self.map.insert(key.to_string(), value);
      }
    }
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn set(
    &mut self,
    key: &str,
    value: impl Into<String>
  ) {
    self
      .map
      .insert(key.to_string(), value.into());
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn get_u32(
    &self,
    key: &str
  ) -> anyhow::Result<Option<u32>> {
    self
      .map
      .get(key)
      .map(|v| {
        v.trim().parse::<u32>().with_context(
          || {
            format!(
              "{key} must be a \
               non-negative integer, \
               got '{v}'"
            )
          }
        )
      })
      .transpose()
  }

  /// Sorted for stable output.
  pub fn entries(
    &self
  ) -> Vec<(&String, &String)> {
    let mut entries: Vec<_> =
      self.map.iter().collect();
    entries.sort();
    entries
  }

  pub fn api_roots(&self) -> ApiRoots {
    let base = self
      .get("api.base_url")
      .unwrap_or_else(|| {
        DEFAULT_API_BASE.to_string()
      });
    match self
      .get("api.pages_url")
      .filter(|p| !p.trim().is_empty())
    {
      | Some(pages) => {
        ApiRoots::new(base, pages)
      }
      | None => ApiRoots::from_base(base)
    }
  }

  pub fn timeout(
    &self
  ) -> anyhow::Result<Duration> {
    let secs = self
      .get_u32("api.timeout_secs")?
      .unwrap_or(30);
    Ok(Duration::from_secs(u64::from(secs)))
  }

  pub fn default_page(&self) -> String {
    self
      .get("page.default")
      .unwrap_or_else(|| "Home".to_string())
  }

  pub fn dashboard_settings(
    &self
  ) -> anyhow::Result<DashboardSettings> {
    let defaults =
      DashboardSettings::default();
    Ok(DashboardSettings {
      weekly_goal:  self
        .get_u32("dashboard.weekly_goal")?
        .unwrap_or(defaults.weekly_goal),
      monthly_goal: self
        .get_u32("dashboard.monthly_goal")?
        .unwrap_or(defaults.monthly_goal)
    })
  }

  pub fn dashboard_window(
    &self
  ) -> anyhow::Result<TimeWindow> {
    match self.get("dashboard.window") {
      | Some(raw) => {
        Ok(raw.parse::<TimeWindow>()?)
      }
      | None => Ok(TimeWindow::default())
    }
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let text =
      fs::read_to_string(path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    let table = toml::from_str::<toml::Table>(
      &text
    )
    .with_context(|| {
        format!(
          "invalid config file {}",
          path.display()
        )
      })?;

    self
      .loaded_files
      .push(path.to_path_buf());

    let mut flat = Vec::new();
    flatten_table("", &table, &mut flat);
    for (key, value) in flat {
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

fn flatten_table(
  prefix: &str,
  table: &toml::Table,
  out: &mut Vec<(String, String)>
) {
  for (name, value) in table {
    let key = if prefix.is_empty() {
      name.clone()
    } else {
      format!("{prefix}.{name}")
    };

    match value {
      | toml::Value::Table(inner) => {
        flatten_table(&key, inner, out)
      }
      | toml::Value::String(s) => {
        out.push((key, s.clone()))
      }
      | toml::Value::Array(_) => {
        warn!(key = %key, "array config values are not supported; skipping");
      }
      | other => {
        out.push((key, other.to_string()))
      }
    }
  }
}

#[tracing::instrument(skip(
  override_path,
  env
))]
fn resolve_config_path<F>(
  override_path: Option<&Path>,
  env: &F
) -> Option<PathBuf>
where
  F: Fn(&str) -> Option<String>
{
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Some(raw) = env(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(trimmed));
    }
  }

  dirs::config_dir().map(|dir| {
    dir.join("taskdeck").join("config.toml")
  })
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
