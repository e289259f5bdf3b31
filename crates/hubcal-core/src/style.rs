use anyhow::{
  Context,
  anyhow
};
use serde::{
  Deserialize,
  Serialize
};

use crate::datetime::{
  Calendar,
  WeekStart,
  resolve_timezone
};
use crate::recurrence::ExpandOptions;

fn style_true() -> bool {
  true
}

fn style_default_end_hour() -> u32 {
  24
}

fn style_default_max_days() -> usize {
  7
}

fn style_default_hour_height() -> f64 {
  20.0
}

fn style_default_row_gap() -> f64 {
  50.0
}

fn style_default_left_offset() -> f64 {
  53.0
}

fn style_default_offset_event() -> f64 {
  3.0
}

fn style_default_stub_height() -> f64 {
  5.0
}

fn style_default_all_day_height() -> f64
{
  25.0
}

fn style_default_all_day_max_height()
-> f64 {
  70.0
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
  #[default]
  Vertical,
  Horizontal
}

/// Display configuration. A `Style` is
/// never mutated in place: overrides
/// produce a new value that is handed to
/// the next layout call.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct Style {
  #[serde(default)]
  pub week_start: WeekStart,
  #[serde(default)]
  pub timezone:   Option<String>,
  #[serde(default)]
  pub month:      MonthStyle,
  #[serde(default)]
  pub week:       WeekStyle,
  #[serde(default)]
  pub timeline:   TimelineStyle,
  #[serde(default)]
  pub event:      EventDisplayStyle,
  #[serde(default)]
  pub all_day:    AllDayStyle
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct MonthStyle {
  #[serde(default)]
  pub scroll_direction: ScrollDirection
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct WeekStyle {
  #[serde(
    default = "style_default_max_days"
  )]
  pub max_days: usize
}

impl Default for WeekStyle {
  fn default() -> Self {
    Self {
      max_days: style_default_max_days()
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct TimelineStyle {
  #[serde(default)]
  pub start_hour:             u32,
  #[serde(
    default = "style_default_end_hour"
  )]
  pub end_hour:               u32,
  #[serde(default)]
  pub start_from_first_event: bool,
  #[serde(default)]
  pub is_hidden_stub_event:   bool,
  #[serde(default = "style_true")]
  pub show_current_time:      bool,
  /// Height of one hour label.
  #[serde(
    default = "style_default_hour_height"
  )]
  pub hour_height:            f64,
  /// Gap between consecutive hour
  /// labels.
  #[serde(
    default = "style_default_row_gap"
  )]
  pub row_gap:                f64,
  /// Width reserved for hour labels
  /// left of the first day column.
  #[serde(
    default = "style_default_left_offset"
  )]
  pub left_offset:            f64,
  /// Right padding inside each column.
  #[serde(
    default = "style_default_offset_event"
  )]
  pub offset_event:           f64,
  #[serde(
    default = "style_default_stub_height"
  )]
  pub stub_height:            f64
}

impl Default for TimelineStyle {
  fn default() -> Self {
    Self {
      start_hour:             0,
      end_hour:
        style_default_end_hour(),
      start_from_first_event: false,
      is_hidden_stub_event:   false,
      show_current_time:      true,
      hour_height:
        style_default_hour_height(),
      row_gap:
        style_default_row_gap(),
      left_offset:
        style_default_left_offset(),
      offset_event:
        style_default_offset_event(),
      stub_height:
        style_default_stub_height()
    }
  }
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct EventDisplayStyle {
  #[serde(default)]
  pub show_recurring_event_in_past: bool
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct AllDayStyle {
  #[serde(
    default = "style_default_all_day_height"
  )]
  pub height:     f64,
  #[serde(
    default = "style_default_all_day_max_height"
  )]
  pub max_height: f64,
  #[serde(default)]
  pub is_pinned:  bool
}

impl Default for AllDayStyle {
  fn default() -> Self {
    Self {
      height:     style_default_all_day_height(
      ),
      max_height:
        style_default_all_day_max_height(),
      is_pinned:  false
    }
  }
}

impl Style {
  #[must_use]
  pub fn calendar(&self) -> Calendar {
    Calendar::new(
      resolve_timezone(
        self.timezone.as_deref()
      ),
      self.week_start
    )
  }

  #[must_use]
  pub fn expand_options(
    &self
  ) -> ExpandOptions {
    ExpandOptions {
      show_recurring_event_in_past: self
        .event
        .show_recurring_event_in_past
    }
  }

  /// Vertical distance between two
  /// consecutive hour gridlines.
  #[must_use]
  pub fn hour_cell(&self) -> f64 {
    self.timeline.row_gap
      + self.timeline.hour_height
  }

  #[must_use]
  pub fn sanitized(mut self) -> Self {
    if self.timeline.start_hour > 23 {
      self.timeline.start_hour = 23;
    }
    if self.timeline.end_hour > 24 {
      self.timeline.end_hour = 24;
    }
    if self.timeline.end_hour
      <= self.timeline.start_hour
    {
      self.timeline.end_hour =
        self.timeline.start_hour + 1;
    }

    self.week.max_days =
      self.week.max_days.clamp(1, 7);

    let timeline = &mut self.timeline;
    if !timeline.hour_height.is_finite()
      || timeline.hour_height <= 0.0
    {
      timeline.hour_height =
        style_default_hour_height();
    }
    if !timeline.row_gap.is_finite()
      || timeline.row_gap < 0.0
    {
      timeline.row_gap =
        style_default_row_gap();
    }
    if !timeline.left_offset.is_finite() {
      timeline.left_offset =
        style_default_left_offset();
    }
    timeline.left_offset =
      timeline.left_offset.max(0.0);
    if !timeline.offset_event.is_finite() {
      timeline.offset_event =
        style_default_offset_event();
    }
    timeline.offset_event =
      timeline.offset_event.max(0.0);
    if !timeline.stub_height.is_finite()
      || timeline.stub_height < 0.0
    {
      timeline.stub_height =
        style_default_stub_height();
    }

    let all_day = &mut self.all_day;
    if !all_day.height.is_finite()
      || all_day.height <= 0.0
    {
      all_day.height =
        style_default_all_day_height();
    }
    if !all_day.max_height.is_finite() {
      all_day.max_height =
        style_default_all_day_max_height();
    }
    if all_day.max_height
      < all_day.height * 2.0
    {
      all_day.max_height =
        all_day.height * 2.0;
    }
    self
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn with_overrides<I>(
    self,
    overrides: I
  ) -> anyhow::Result<Self>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    let mut next = self;
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      tracing::debug!(key = %key, value = %v, "applying style override");
      next = next
        .with_override(&key, &v)
        .with_context(|| {
          format!(
            "invalid override {key}={v}"
          )
        })?;
    }
    Ok(next.sanitized())
  }

  fn with_override(
    mut self,
    key: &str,
    value: &str
  ) -> anyhow::Result<Self> {
    let value = value.trim();
    match key {
      | "week_start" => {
        self.week_start =
          WeekStart::parse(value)
            .ok_or_else(|| {
              anyhow!(
                "expected sunday or \
                 monday"
              )
            })?;
      }
      | "timezone" => {
        self.timezone =
          Some(value.to_string());
      }
      | "month.scroll_direction" => {
        self.month.scroll_direction =
          match value
            .to_ascii_lowercase()
            .as_str()
          {
            | "vertical" => {
              ScrollDirection::Vertical
            }
            | "horizontal" => {
              ScrollDirection::Horizontal
            }
            | other => {
              return Err(anyhow!(
                "unknown scroll \
                 direction: {other}"
              ));
            }
          };
      }
      | "week.max_days" => {
        self.week.max_days =
          value.parse()?;
      }
      | "timeline.start_hour" => {
        self.timeline.start_hour =
          value.parse()?;
      }
      | "timeline.end_hour" => {
        self.timeline.end_hour =
          value.parse()?;
      }
      | "timeline.start_from_first_event" => {
        self
          .timeline
          .start_from_first_event =
          parse_bool(value);
      }
      | "timeline.is_hidden_stub_event" => {
        self
          .timeline
          .is_hidden_stub_event =
          parse_bool(value);
      }
      | "timeline.show_current_time" => {
        self.timeline.show_current_time =
          parse_bool(value);
      }
      | "timeline.hour_height" => {
        self.timeline.hour_height =
          value.parse()?;
      }
      | "timeline.row_gap" => {
        self.timeline.row_gap =
          value.parse()?;
      }
      | "timeline.left_offset" => {
        self.timeline.left_offset =
          value.parse()?;
      }
      | "event.show_recurring_event_in_past" => {
        self
          .event
          .show_recurring_event_in_past =
          parse_bool(value);
      }
      | "all_day.height" => {
        self.all_day.height =
          value.parse()?;
      }
      | "all_day.max_height" => {
        self.all_day.max_height =
          value.parse()?;
      }
      | "all_day.is_pinned" => {
        self.all_day.is_pinned =
          parse_bool(value);
      }
      | other => {
        return Err(anyhow!(
          "unknown style key: {other}"
        ));
      }
    }
    Ok(self)
  }
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
