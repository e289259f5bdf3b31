use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::Context;
use tracing::{
  debug,
  info
};

use crate::style::Style;

pub const CONFIG_FILE: &str =
  "hubcal.toml";
pub const CONFIG_ENV_VAR: &str =
  "HUBCAL_CONFIG";

/// Loaded style plus the file it came
/// from, if any.
#[derive(Debug, Clone)]
pub struct Config {
  pub style:       Style,
  pub loaded_file: Option<PathBuf>
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(config_override)
    else {
      info!(
        "no hubcal.toml found; using \
         default style"
      );
      return Ok(Self {
        style:       Style::default(),
        loaded_file: None
      });
    };

    info!(config = %path.display(), "loading style config");
    let style = load_style_file(&path)?;
    Ok(Self {
      style,
      loaded_file: Some(path)
    })
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    self,
    overrides: I
  ) -> anyhow::Result<Self>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    let style =
      self.style.with_overrides(overrides)?;
    Ok(Self { style, ..self })
  }
}

fn load_style_file(
  path: &Path
) -> anyhow::Result<Style> {
  let raw = fs::read_to_string(path)
    .with_context(|| {
      format!(
        "failed to read {}",
        path.display()
      )
    })?;

  let style =
    toml::from_str::<Style>(&raw)
      .with_context(|| {
        format!(
          "failed to parse {}",
          path.display()
        )
      })?;

  debug!(
    file = %path.display(),
    week_start = ?style.week_start,
    timezone = ?style.timezone,
    "parsed style config"
  );
  Ok(style.sanitized())
}

/// An explicit path must exist; the
/// implicit candidates are skipped when
/// missing.
fn resolve_config_path(
  config_override: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = config_override {
    return Some(expand_tilde(path));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(expand_tilde(
        Path::new(trimmed)
      ));
    }
  }

  let candidates = [
    std::env::current_dir()
      .ok()
      .map(|dir| dir.join(CONFIG_FILE)),
    dirs::config_dir().map(|dir| {
      dir.join("hubcal").join(CONFIG_FILE)
    })
  ];

  candidates
    .into_iter()
    .flatten()
    .find(|path| {
      let exists = path.exists();
      if !exists {
        debug!(candidate = %path.display(), "config candidate not found");
      }
      exists
    })
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use tempfile::NamedTempFile;

  use super::*;
  use crate::datetime::WeekStart;

  #[test]
  fn loads_explicit_config_file() {
    let mut file = NamedTempFile::new()
      .expect("temp file");
    writeln!(
      file,
      "week_start = \"sunday\"\n\
       [timeline]\n\
       start_hour = 6\n\
       end_hour = 4"
    )
    .expect("write config");

    let cfg = Config::load(Some(
      file.path()
    ))
    .expect("load config");
    assert_eq!(
      cfg.style.week_start,
      WeekStart::Sunday
    );
    assert_eq!(
      cfg.style.timeline.start_hour,
      6
    );
    // sanitized: end must follow start
    assert_eq!(
      cfg.style.timeline.end_hour,
      7
    );
    assert_eq!(
      cfg.loaded_file.as_deref(),
      Some(file.path())
    );
  }

  #[test]
  fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir()
      .expect("temp dir");
    let missing =
      dir.path().join("nope.toml");
    assert!(
      Config::load(Some(&missing))
        .is_err()
    );
  }

  #[test]
  fn overrides_apply_on_top_of_file() {
    let cfg = Config {
      style:       Style::default(),
      loaded_file: None
    }
    .apply_overrides(vec![(
      "all_day.is_pinned".to_string(),
      "yes".to_string()
    )])
    .expect("apply");
    assert!(cfg.style.all_day.is_pinned);
  }
}
