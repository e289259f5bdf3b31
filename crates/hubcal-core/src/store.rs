use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::event::{Event, validate_events};

/// Read-only source of schedules: a JSON array or one event per line.
#[derive(Debug, Clone)]
pub struct EventStore {
    pub path: PathBuf,
}

impl EventStore {
    pub fn open(path: &Path) -> Self {
        info!(file = %path.display(), "using events file");
        Self {
            path: path.to_path_buf(),
        }
    }

    /// A missing file is an empty schedule list.
    #[tracing::instrument(skip(self), fields(file = %self.path.display()))]
    pub fn load(&self) -> anyhow::Result<Vec<Event>> {
        if !self.path.exists() {
            debug!("events file does not exist yet");
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading {}", self.path.display()))?;
        let events = parse_events(&raw, &self.path)?;
        validate_events(&events)
            .with_context(|| format!("invalid event in {}", self.path.display()))?;

        debug!(count = events.len(), "loaded events");
        Ok(events)
    }
}

fn parse_events(raw: &str, path: &Path) -> anyhow::Result<Vec<Event>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} as a JSON array", path.display()));
    }

    let mut out = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(line)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(event);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 5, h, 0, 0)
            .single()
            .expect("valid instant")
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = EventStore::open(&dir.path().join("events.json"));
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn reads_arrays_and_json_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let array = dir.path().join("events.json");
        fs::write(
            &array,
            r#"[{"id":"a","start":"2026-03-05T09:00:00Z","end":"2026-03-05T10:00:00Z"}]"#,
        )
        .expect("seed array");
        let from_array = EventStore::open(&array).load().expect("load array");
        assert_eq!(from_array, vec![Event::new("a", "", at(9), at(10))]);

        let daily = Event::new("b", "Lights", at(20), at(21)).repeating_daily();
        let lines = dir.path().join("events.jsonl");
        fs::write(
            &lines,
            format!(
                "{}\n\n{}\n",
                serde_json::to_string(&from_array[0]).expect("serialize"),
                serde_json::to_string(&daily).expect("serialize")
            ),
        )
        .expect("seed lines");
        let from_lines = EventStore::open(&lines).load().expect("load lines");
        assert_eq!(from_lines.len(), 2);
        assert_eq!(from_lines[1], daily);
    }

    #[test]
    fn malformed_events_are_rejected_on_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("events.jsonl");
        fs::write(
            &path,
            "{\"id\":\"x\",\"start\":\"2026-03-05T10:00:00Z\",\"end\":\"2026-03-05T09:00:00Z\"}\n",
        )
        .expect("seed file");
        let err = EventStore::open(&path).load().expect_err("inverted event");
        assert!(format!("{err:#}").contains("events.jsonl"));
    }
}
