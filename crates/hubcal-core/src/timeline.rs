//! Timeline layout: hour gridlines, event
//! rectangles per day column, the all-day
//! band, stub frames and the current-time
//! marker.
//!
//! Geometry is in points. Rectangle `x`
//! is relative to its column; column `x`
//! is relative to the view.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{
  DateTime,
  NaiveDate,
  NaiveTime,
  Timelike,
  Utc
};
use tracing::{
  debug,
  trace
};

use crate::datetime::{
  Calendar,
  add_days
};
use crate::error::CalendarError;
use crate::event::{
  Event,
  EventId,
  validate_events
};
use crate::recurrence::expand_for_day;
use crate::style::Style;

const MINUTES_PER_HOUR: u32 = 60;
const MINUTES_PER_DAY: u32 =
  24 * MINUTES_PER_HOUR;
const STUB_ALL_DAY_PADDING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
  pub width:  f64,
  pub height: f64
}

#[derive(Debug, Clone)]
pub struct TimelineInput {
  pub dates:            Vec<NaiveDate>,
  pub events:           Vec<Event>,
  pub recurring_events: Vec<Event>,
  pub selected_date:    NaiveDate,
  pub viewport:         Viewport,
  pub now:              DateTime<Utc>
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourLine {
  pub hour: u32,
  pub row:  usize,
  /// Gridline position, centered on the
  /// hour label.
  pub y:    f64
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRect {
  pub event:  Event,
  pub x:      f64,
  pub y:      f64,
  pub width:  f64,
  pub height: f64,
  pub lane:   usize,
  pub lanes:  usize
}

impl EventRect {
  #[must_use]
  pub fn event_id(&self) -> &EventId {
    &self.event.id
  }

  #[must_use]
  pub fn bottom(&self) -> f64 {
    self.y + self.height
  }

  #[must_use]
  pub fn right(&self) -> f64 {
    self.x + self.width
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum StubPosition {
  Top,
  Bottom
}

/// Compact frame listing events that
/// have no rectangle in the scrolling
/// area.
#[derive(Debug, Clone, PartialEq)]
pub struct StubFrame {
  pub position:  StubPosition,
  pub y:         f64,
  pub height:    f64,
  pub event_ids: Vec<EventId>
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayColumn {
  pub date:    NaiveDate,
  pub x:       f64,
  pub width:   f64,
  pub rects:   Vec<EventRect>,
  pub all_day: Vec<Event>,
  pub stubs:   Vec<StubFrame>
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllDayBand {
  pub height:     f64,
  pub max_events: usize,
  pub is_pinned:  bool
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentTimeMarker {
  pub date:  NaiveDate,
  pub time:  NaiveTime,
  pub x:     f64,
  pub width: f64,
  pub y:     f64
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineLayout {
  pub start_hour:     u32,
  pub end_hour:       u32,
  pub hour_lines:     Vec<HourLine>,
  pub columns:        Vec<DayColumn>,
  pub all_day_band:   Option<AllDayBand>,
  pub current_time:   Option<CurrentTimeMarker>,
  pub content_height: f64
}

/// Timed events of one column after
/// clipping to the column's day, in
/// local minutes since midnight.
#[derive(Debug, Clone)]
struct Segment {
  event:     Event,
  start_min: u32,
  end_min:   u32
}

impl Segment {
  fn overlaps(
    &self,
    start_min: u32,
    end_min: u32
  ) -> bool {
    self.start_min < end_min
      && start_min < self.end_min
  }
}

#[derive(Debug, Clone)]
pub struct TimelineEngine {
  style:    Style,
  calendar: Calendar
}

impl TimelineEngine {
  #[must_use]
  pub fn new(
    style: Style,
    calendar: Calendar
  ) -> Self {
    Self {
      style: style.sanitized(),
      calendar
    }
  }

  #[must_use]
  pub fn style(&self) -> &Style {
    &self.style
  }

  /// Y of `minute` within the hour drawn
  /// on `row`. Minute 59 reaches the next
  /// gridline.
  #[must_use]
  pub fn point_y(
    &self,
    row: usize,
    minute: u32
  ) -> f64 {
    let cell = self.style.hour_cell();
    let label = self.style.timeline.hour_height;
    let summ_y =
      row as f64 * cell + label / 2.0;
    match minute {
      | 1..=59 => {
        let minute_percent =
          59.0 / f64::from(minute);
        let new_y = cell / minute_percent;
        if row == 0 {
          new_y + label / 2.0
        } else {
          summ_y + new_y
        }
      }
      | _ => summ_y
    }
  }

  #[tracing::instrument(
    skip(self, input),
    fields(
      dates = input.dates.len(),
      events = input.events.len(),
      recurring = input.recurring_events.len()
    )
  )]
  pub fn layout(
    &self,
    input: &TimelineInput
  ) -> Result<TimelineLayout, CalendarError>
  {
    validate_events(&input.events)?;
    validate_events(&input.recurring_events)?;

    let recurring =
      collect_recurring(input);
    let gathered = input
      .dates
      .iter()
      .map(|date| {
        (*date, self.gather(input, &recurring, *date))
      })
      .collect::<Vec<_>>();

    let start_hour =
      self.resolve_start_hour(input, &gathered);
    let end_hour =
      self.style.timeline.end_hour.max(start_hour + 1);

    let hour_lines = (start_hour..=end_hour)
      .enumerate()
      .map(|(row, hour)| {
        HourLine {
          hour,
          row,
          y: self.point_y(row, 0)
        }
      })
      .collect::<Vec<_>>();

    let left = self.style.timeline.left_offset;
    let column_width = if input.dates.is_empty()
    {
      0.0
    } else {
      ((input.viewport.width - left)
        / input.dates.len() as f64)
        .max(0.0)
    };

    let max_all_day = gathered
      .iter()
      .map(|(_, (_, all_day))| all_day.len())
      .max()
      .unwrap_or(0);

    let columns = gathered
      .into_iter()
      .enumerate()
      .map(|(idx, (date, (timed, all_day)))| {
        self.column(
          date,
          left + idx as f64 * column_width,
          column_width,
          timed,
          all_day,
          (start_hour, end_hour),
          input.viewport
        )
      })
      .collect::<Vec<_>>();

    let all_day_band =
      self.all_day_band(max_all_day);
    let current_time = self.current_time(
      input.now,
      &columns,
      (start_hour, end_hour)
    );
    let rows = hour_lines.len() as f64;
    let content_height = (rows
      * self.style.hour_cell()
      - self.style.timeline.row_gap)
      .max(0.0);

    debug!(
      start_hour,
      end_hour,
      rects = columns
        .iter()
        .map(|column| column.rects.len())
        .sum::<usize>(),
      band = ?all_day_band.as_ref().map(|band| band.height),
      marker = current_time.is_some(),
      "timeline laid out"
    );

    Ok(TimelineLayout {
      start_hour,
      end_hour,
      hour_lines,
      columns,
      all_day_band,
      current_time,
      content_height
    })
  }

  /// Timed and all-day events occupying
  /// `date`, explicit ones first, then
  /// recurring projections.
  fn gather(
    &self,
    input: &TimelineInput,
    recurring: &[Event],
    date: NaiveDate
  ) -> (Vec<Event>, Vec<Event>) {
    let explicit = input
      .events
      .iter()
      .filter(|event| {
        !event.is_recurring()
          && event.touches(date, &self.calendar)
      })
      .cloned()
      .collect::<Vec<_>>();

    let projections = expand_for_day(
      recurring,
      &explicit,
      date,
      &self.calendar,
      self.style.expand_options()
    );
    trace!(
      %date,
      explicit = explicit.len(),
      projected = projections.len(),
      "gathered timeline events"
    );

    let (all_day, mut timed): (
      Vec<Event>,
      Vec<Event>
    ) = explicit
      .into_iter()
      .chain(projections)
      .partition(|event| event.is_all_day);

    timed.sort_by(|lhs, rhs| {
      self.order_events(lhs, rhs)
    });
    (timed, all_day)
  }

  /// Width overrides first, then start
  /// hour. Equal keys keep input order.
  fn order_events(
    &self,
    lhs: &Event,
    rhs: &Event
  ) -> Ordering {
    let lhs_width = lhs.default_width().is_some();
    let rhs_width = rhs.default_width().is_some();
    rhs_width.cmp(&lhs_width).then_with(|| {
      self
        .calendar
        .hour(lhs.start)
        .cmp(&self.calendar.hour(rhs.start))
    })
  }

  fn resolve_start_hour(
    &self,
    input: &TimelineInput,
    gathered: &[(NaiveDate, (Vec<Event>, Vec<Event>))]
  ) -> u32 {
    let fixed = self.style.timeline.start_hour;
    if !self.style.timeline.start_from_first_event
    {
      return fixed;
    }

    let timed = gathered
      .iter()
      .flat_map(|(_, (timed, _))| timed.iter());
    let earliest = if input.dates.len() > 1 {
      timed
        .map(|event| self.calendar.hour(event.start))
        .min()
    } else {
      timed
        .filter(|event| {
          event.starts_on(
            input.selected_date,
            &self.calendar
          )
        })
        .map(|event| self.calendar.hour(event.start))
        .min()
    };
    earliest.unwrap_or(fixed).min(23)
  }

  #[allow(clippy::too_many_arguments)]
  fn column(
    &self,
    date: NaiveDate,
    x: f64,
    width: f64,
    timed: Vec<Event>,
    all_day: Vec<Event>,
    (start_hour, end_hour): (u32, u32),
    viewport: Viewport
  ) -> DayColumn {
    let visible_start = start_hour * MINUTES_PER_HOUR;
    let visible_end = end_hour * MINUTES_PER_HOUR;

    let mut above = Vec::new();
    let mut below = Vec::new();
    let mut visible = Vec::new();
    for event in timed {
      let Some((start_min, end_min)) =
        self.clip_to_day(&event, date)
      else {
        trace!(id = %event.id, %date, "event misses the day");
        continue;
      };
      if end_min <= visible_start {
        above.push(event.id.clone());
      } else if start_min >= visible_end {
        below.push(event.id.clone());
      } else {
        visible.push(Segment {
          event,
          start_min: start_min.max(visible_start),
          end_min: end_min.min(visible_end)
        });
      }
    }

    let usable =
      (width - self.style.timeline.offset_event).max(0.0);
    let lanes = assign_lanes(&visible);
    let rects = visible
      .into_iter()
      .zip(lanes)
      .map(|(segment, (lane, lanes))| {
        let lane_width = usable / lanes as f64;
        let width = segment
          .event
          .default_width()
          .map_or(lane_width, |preferred| {
            preferred.clamp(0.0, lane_width)
          });
        let y = self.minute_y(segment.start_min, start_hour);
        let bottom =
          self.minute_y(segment.end_min, start_hour);
        EventRect {
          x: lane as f64 * lane_width,
          y,
          width,
          height: (bottom - y).max(0.0),
          lane,
          lanes,
          event: segment.event
        }
      })
      .collect::<Vec<_>>();

    let stubs = self.stubs(
      &all_day,
      above,
      below,
      viewport
    );

    DayColumn {
      date,
      x,
      width,
      rects,
      all_day,
      stubs
    }
  }

  /// Local minutes since midnight that
  /// `event` covers on `date`. The start
  /// follows the wall clock; the end falls
  /// back to the elapsed duration when the
  /// wall clock runs backwards (DST repeat
  /// hour) or the event is under a minute.
  /// `None` only when the event misses the
  /// day entirely.
  fn clip_to_day(
    &self,
    event: &Event,
    date: NaiveDate
  ) -> Option<(u32, u32)> {
    let day_start =
      self.calendar.start_of_day(date);
    let day_end = self
      .calendar
      .start_of_day(add_days(date, 1));
    if event.end <= day_start
      || event.start >= day_end
    {
      return None;
    }

    let start_min = if event.start <= day_start {
      0
    } else {
      local_minutes(self.calendar.time_of(event.start))
    };
    if event.end >= day_end {
      return Some((start_min, MINUTES_PER_DAY));
    }

    let wall_end =
      local_minutes(self.calendar.time_of(event.end));
    let end_min = if wall_end > start_min {
      wall_end
    } else {
      let elapsed =
        event.end - event.start.max(day_start);
      let minutes = (elapsed.num_seconds().max(0) + 59)
        / i64::from(MINUTES_PER_HOUR);
      start_min.saturating_add(
        u32::try_from(minutes).unwrap_or(MINUTES_PER_DAY)
      )
    };
    let end_min = end_min
      .max(start_min + 1)
      .min(MINUTES_PER_DAY);
    Some((start_min, end_min))
  }

  fn minute_y(
    &self,
    minutes: u32,
    start_hour: u32
  ) -> f64 {
    let hour = minutes / MINUTES_PER_HOUR;
    let row = hour.saturating_sub(start_hour) as usize;
    self.point_y(row, minutes % MINUTES_PER_HOUR)
  }

  fn stubs(
    &self,
    all_day: &[Event],
    above: Vec<EventId>,
    below: Vec<EventId>,
    viewport: Viewport
  ) -> Vec<StubFrame> {
    if self.style.timeline.is_hidden_stub_event {
      return Vec::new();
    }
    if all_day.is_empty()
      && above.is_empty()
      && below.is_empty()
    {
      return Vec::new();
    }

    let stub_height = self.style.timeline.stub_height;
    let top_y = match all_day.len() {
      | 0 => 0.0,
      | 1..=2 => {
        self.style.all_day.height
          + STUB_ALL_DAY_PADDING
      }
      | count => self.band_height(count)
    };
    let top_ids = all_day
      .iter()
      .map(|event| event.id.clone())
      .chain(above)
      .collect();

    vec![
      StubFrame {
        position:  StubPosition::Top,
        y:         top_y,
        height:    stub_height,
        event_ids: top_ids
      },
      StubFrame {
        position:  StubPosition::Bottom,
        y:         (viewport.height - stub_height)
          .max(0.0),
        height:    stub_height,
        event_ids: below
      },
    ]
  }

  fn band_height(
    &self,
    count: usize
  ) -> f64 {
    let all_day = &self.style.all_day;
    match count {
      | 0..=2 => all_day.height,
      | 3..=4 => all_day.height * 2.0,
      | _ => all_day.max_height
    }
  }

  fn all_day_band(
    &self,
    max_events: usize
  ) -> Option<AllDayBand> {
    (max_events > 0).then(|| {
      AllDayBand {
        height: self.band_height(max_events),
        max_events,
        is_pinned: self.style.all_day.is_pinned
      }
    })
  }

  fn current_time(
    &self,
    now: DateTime<Utc>,
    columns: &[DayColumn],
    (start_hour, end_hour): (u32, u32)
  ) -> Option<CurrentTimeMarker> {
    if !self.style.timeline.show_current_time {
      return None;
    }
    let today = self.calendar.today(now);
    let column = columns
      .iter()
      .find(|column| column.date == today)?;

    let time = self.calendar.time_of(now);
    let hour = time.hour();
    if hour < start_hour || hour >= end_hour {
      return None;
    }

    Some(CurrentTimeMarker {
      date: today,
      time,
      x: column.x,
      width: column.width,
      y: self.point_y(
        (hour - start_hour) as usize,
        time.minute()
      )
    })
  }
}

fn local_minutes(time: NaiveTime) -> u32 {
  time.hour() * MINUTES_PER_HOUR + time.minute()
}

/// Recurring events from both inputs,
/// once per identity.
fn collect_recurring(
  input: &TimelineInput
) -> Vec<Event> {
  let mut seen = HashSet::new();
  input
    .recurring_events
    .iter()
    .chain(input.events.iter())
    .filter(|event| event.is_recurring())
    .filter(|event| seen.insert(event.id.clone()))
    .cloned()
    .collect()
}

/// `(lane, lanes)` per segment. Segments
/// that overlap transitively form one
/// group; inside a group lanes are taken
/// first-fit in segment order.
fn assign_lanes(
  segments: &[Segment]
) -> Vec<(usize, usize)> {
  let mut by_time =
    (0..segments.len()).collect::<Vec<_>>();
  by_time.sort_by_key(|idx| {
    (segments[*idx].start_min, segments[*idx].end_min)
  });

  let mut group_of = vec![0_usize; segments.len()];
  let mut group = 0;
  let mut group_end = None;
  for idx in by_time {
    let segment = &segments[idx];
    if let Some(end) = group_end
      && segment.start_min >= end
    {
      group += 1;
      group_end = None;
    }
    group_end = Some(
      group_end.map_or(segment.end_min, |end: u32| {
        end.max(segment.end_min)
      })
    );
    group_of[idx] = group;
  }

  let mut result = vec![(0, 1); segments.len()];
  for current in 0..=group {
    let members = (0..segments.len())
      .filter(|idx| group_of[*idx] == current)
      .collect::<Vec<_>>();
    let mut lanes: Vec<Vec<usize>> = Vec::new();
    for idx in &members {
      let segment = &segments[*idx];
      let free = lanes.iter().position(|lane| {
        lane.iter().all(|other| {
          !segments[*other].overlaps(
            segment.start_min,
            segment.end_min
          )
        })
      });
      let lane = match free {
        | Some(lane) => lane,
        | None => {
          lanes.push(Vec::new());
          lanes.len() - 1
        }
      };
      lanes[lane].push(*idx);
      result[*idx].0 = lane;
    }
    for idx in members {
      result[idx].1 = lanes.len().max(1);
    }
  }
  result
}

#[cfg(test)]
mod tests {
  use chrono::{
    Duration,
    TimeZone
  };
  use proptest::prelude::*;

  use super::*;

  const EPS: f64 = 1e-6;

  fn at(
    d: u32,
    h: u32,
    m: u32
  ) -> DateTime<Utc> {
    Utc
      .with_ymd_and_hms(2026, 3, d, h, m, 0)
      .single()
      .expect("valid instant")
  }

  fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d)
      .expect("valid date")
  }

  fn engine(
    tweak: impl FnOnce(&mut Style)
  ) -> TimelineEngine {
    let mut style = Style::default();
    tweak(&mut style);
    TimelineEngine::new(
      style,
      Calendar::default()
    )
  }

  fn input(
    dates: Vec<NaiveDate>,
    events: Vec<Event>
  ) -> TimelineInput {
    TimelineInput {
      selected_date: dates[0],
      dates,
      events,
      recurring_events: Vec::new(),
      viewport: Viewport {
        width:  453.0,
        height: 800.0
      },
      now: at(1, 12, 0)
    }
  }

  #[test]
  fn one_hour_event_spans_one_cell() {
    let engine = engine(|style| {
      style.timeline.start_hour = 8;
    });
    let layout = engine
      .layout(&input(
        vec![day(5)],
        vec![Event::new(
          "bulb",
          "Lights",
          at(5, 9, 0),
          at(5, 10, 0)
        )]
      ))
      .expect("layout");

    let cell = engine.style().hour_cell();
    let rect = &layout.columns[0].rects[0];
    let first_line = layout.hour_lines[0].y;
    assert_eq!(layout.hour_lines[0].hour, 8);
    assert!((rect.y - first_line - cell).abs() < EPS);
    assert!((rect.height - cell).abs() < EPS);
    assert_eq!(rect.x, 0.0);
    assert!((rect.width - (400.0 - 3.0)).abs() < EPS);
    assert_eq!(layout.columns[0].x, 53.0);
  }

  #[test]
  fn point_y_interpolates_within_the_hour() {
    let engine = engine(|_| {});
    let cell = engine.style().hour_cell();
    let half = engine.style().timeline.hour_height / 2.0;
    assert!((engine.point_y(0, 0) - half).abs() < EPS);
    assert!(
      (engine.point_y(3, 0) - (3.0 * cell + half)).abs()
        < EPS
    );
    assert!(
      (engine.point_y(0, 59) - (cell + half)).abs() < EPS
    );
    assert!(engine.point_y(2, 30) > engine.point_y(2, 29));
  }

  #[test]
  fn overlapping_events_share_the_column() {
    let engine = engine(|_| {});
    let layout = engine
      .layout(&input(
        vec![day(5)],
        vec![
          Event::new("a", "A", at(5, 9, 0), at(5, 11, 0)),
          Event::new("b", "B", at(5, 10, 0), at(5, 12, 0)),
          Event::new("c", "C", at(5, 13, 0), at(5, 14, 0)),
        ]
      ))
      .expect("layout");

    let rects = &layout.columns[0].rects;
    assert_eq!(rects.len(), 3);
    let usable = 400.0 - 3.0;
    assert_eq!((rects[0].lane, rects[0].lanes), (0, 2));
    assert_eq!((rects[1].lane, rects[1].lanes), (1, 2));
    assert!((rects[1].x - usable / 2.0).abs() < EPS);
    assert_eq!((rects[2].lane, rects[2].lanes), (0, 1));
    assert!((rects[2].width - usable).abs() < EPS);
  }

  #[test]
  fn width_override_sorts_first_and_shrinks() {
    let engine = engine(|_| {});
    let layout = engine
      .layout(&input(
        vec![day(5)],
        vec![
          Event::new("a", "A", at(5, 9, 0), at(5, 11, 0)),
          Event::new("b", "B", at(5, 10, 0), at(5, 12, 0))
            .with_default_width(40.0),
        ]
      ))
      .expect("layout");

    let rects = &layout.columns[0].rects;
    assert_eq!(rects[0].event_id().as_str(), "b");
    assert_eq!(rects[0].lane, 0);
    assert!((rects[0].width - 40.0).abs() < EPS);
    assert_eq!(rects[1].lane, 1);
  }

  #[test]
  fn all_day_band_grows_in_steps() {
    let engine = engine(|_| {});
    let band_for = |count: usize| {
      let events = (0..count)
        .map(|idx| {
          Event::new(
            format!("ad{idx}"),
            "Away",
            at(5, 0, 0),
            at(5, 23, 0)
          )
          .all_day()
        })
        .collect::<Vec<_>>();
      engine
        .layout(&input(vec![day(5), day(6)], events))
        .expect("layout")
        .all_day_band
        .map(|band| band.height)
    };

    assert_eq!(band_for(0), None);
    assert_eq!(band_for(2), Some(25.0));
    assert_eq!(band_for(3), Some(50.0));
    assert_eq!(band_for(4), Some(50.0));
    assert_eq!(band_for(5), Some(70.0));
  }

  #[test]
  fn current_time_marker_follows_visibility() {
    let base = input(vec![day(5), day(6)], Vec::new());

    let engine_default = engine(|style| {
      style.timeline.start_hour = 8;
    });
    let marker = engine_default
      .layout(&TimelineInput {
        now: at(6, 10, 30),
        ..base.clone()
      })
      .expect("layout")
      .current_time
      .expect("marker on visible today");
    assert_eq!(marker.date, day(6));
    assert!(
      (marker.y - engine_default.point_y(2, 30)).abs() < EPS
    );
    assert!((marker.x - 253.0).abs() < EPS);

    let before_start = engine_default
      .layout(&TimelineInput {
        now: at(6, 7, 30),
        ..base.clone()
      })
      .expect("layout");
    assert!(before_start.current_time.is_none());

    let elsewhere = engine_default
      .layout(&TimelineInput {
        now: at(9, 10, 30),
        ..base.clone()
      })
      .expect("layout");
    assert!(elsewhere.current_time.is_none());

    let hidden = engine(|style| {
      style.timeline.show_current_time = false;
    })
    .layout(&TimelineInput {
      now: at(6, 10, 30),
      ..base
    })
    .expect("layout");
    assert!(hidden.current_time.is_none());
  }

  #[test]
  fn events_outside_visible_hours_become_stubs() {
    let events = vec![
      Event::new("early", "Early", at(5, 5, 0), at(5, 6, 0)),
      Event::new("late", "Late", at(5, 22, 0), at(5, 23, 0)),
      Event::new("mid", "Mid", at(5, 12, 0), at(5, 13, 0)),
    ];
    let shown = engine(|style| {
      style.timeline.start_hour = 8;
      style.timeline.end_hour = 20;
    })
    .layout(&input(vec![day(5)], events.clone()))
    .expect("layout");

    let column = &shown.columns[0];
    assert_eq!(column.rects.len(), 1);
    assert_eq!(column.stubs.len(), 2);
    assert_eq!(column.stubs[0].position, StubPosition::Top);
    assert_eq!(column.stubs[0].event_ids, vec![EventId::new("early")]);
    assert_eq!(column.stubs[1].event_ids, vec![EventId::new("late")]);

    let hidden = engine(|style| {
      style.timeline.start_hour = 8;
      style.timeline.end_hour = 20;
      style.timeline.is_hidden_stub_event = true;
    })
    .layout(&input(vec![day(5)], events))
    .expect("layout");
    assert!(hidden.columns[0].stubs.is_empty());
  }

  #[test]
  fn start_hour_can_follow_first_event() {
    let engine = engine(|style| {
      style.timeline.start_hour = 2;
      style.timeline.start_from_first_event = true;
    });
    let events = vec![
      Event::new("a", "A", at(5, 14, 0), at(5, 15, 0)),
      Event::new("b", "B", at(6, 7, 0), at(6, 8, 0)),
    ];

    let single = engine
      .layout(&input(vec![day(5)], events.clone()))
      .expect("layout");
    assert_eq!(single.start_hour, 14);

    let multi = engine
      .layout(&input(vec![day(5), day(6)], events))
      .expect("layout");
    assert_eq!(multi.start_hour, 7);

    let empty = engine
      .layout(&input(vec![day(9)], Vec::new()))
      .expect("layout");
    assert_eq!(empty.start_hour, 2);
  }

  #[test]
  fn recurring_events_project_once_per_day() {
    let engine = engine(|_| {});
    let daily = Event::new(
      "lock",
      "Lock",
      at(1, 22, 0),
      at(1, 22, 30)
    )
    .repeating_daily();
    let mut moved = daily.clone();
    moved.recurrence = crate::event::Recurrence::None;
    moved.start = at(6, 20, 0);
    moved.end = at(6, 20, 30);

    let layout = engine
      .layout(&TimelineInput {
        recurring_events: vec![daily.clone()],
        ..input(vec![day(5), day(6)], vec![daily, moved])
      })
      .expect("layout");

    let fifth = &layout.columns[0].rects;
    assert_eq!(fifth.len(), 1);
    assert_eq!(fifth[0].event.start, at(5, 22, 0));

    let sixth = &layout.columns[1].rects;
    assert_eq!(sixth.len(), 1);
    assert_eq!(sixth[0].event.start, at(6, 20, 0));
  }

  #[test]
  fn overnight_daily_event_shows_tail_and_head() {
    let engine = engine(|_| {});
    let nightly = Event::new(
      "night",
      "Night mode",
      at(1, 23, 30),
      at(2, 0, 10)
    )
    .repeating_daily();

    let layout = engine
      .layout(&input(vec![day(5)], vec![nightly]))
      .expect("layout");

    let mut spans = layout.columns[0]
      .rects
      .iter()
      .map(|rect| (rect.y, rect.bottom()))
      .collect::<Vec<_>>();
    spans.sort_by(|lhs, rhs| lhs.0.total_cmp(&rhs.0));
    assert_eq!(spans.len(), 2);

    let (tail_top, tail_bottom) = spans[0];
    assert!((tail_top - engine.point_y(0, 0)).abs() < EPS);
    assert!(
      (tail_bottom - engine.point_y(0, 10)).abs() < EPS
    );

    let (head_top, head_bottom) = spans[1];
    assert!((head_top - engine.point_y(23, 30)).abs() < EPS);
    assert!(
      (head_bottom - engine.point_y(24, 0)).abs() < EPS
    );
    assert!(
      layout.columns[0]
        .rects
        .iter()
        .all(|rect| rect.lanes == 1 && rect.height > 0.0)
    );
  }

  #[test]
  fn repeated_fall_back_hour_keeps_its_length() {
    let engine = TimelineEngine::new(
      Style::default(),
      Calendar::new(
        chrono_tz::America::New_York,
        crate::datetime::WeekStart::Monday
      )
    );
    let nov_first = NaiveDate::from_ymd_opt(2026, 11, 1)
      .expect("valid date");
    let start = Utc
      .with_ymd_and_hms(2026, 11, 1, 5, 30, 0)
      .single()
      .expect("valid instant");
    let end = Utc
      .with_ymd_and_hms(2026, 11, 1, 6, 15, 0)
      .single()
      .expect("valid instant");

    let layout = engine
      .layout(&input(
        vec![nov_first],
        vec![Event::new("fan", "Fan", start, end)]
      ))
      .expect("layout");

    let column = &layout.columns[0];
    assert!(column.stubs.is_empty());
    assert_eq!(column.rects.len(), 1);
    let rect = &column.rects[0];
    assert!((rect.y - engine.point_y(1, 30)).abs() < EPS);
    assert!(
      (rect.bottom() - engine.point_y(2, 15)).abs() < EPS
    );
  }

  #[test]
  fn sub_minute_event_still_gets_a_rect() {
    let engine = engine(|_| {});
    let blink = Event::new(
      "blink",
      "Blink",
      at(5, 9, 0),
      at(5, 9, 0) + Duration::seconds(40)
    );

    let layout = engine
      .layout(&input(vec![day(5)], vec![blink]))
      .expect("layout");

    let rects = &layout.columns[0].rects;
    assert_eq!(rects.len(), 1);
    assert!((rects[0].y - engine.point_y(9, 0)).abs() < EPS);
    assert!(
      (rects[0].bottom() - engine.point_y(9, 1)).abs() < EPS
    );
    assert!(rects[0].height > 0.0);
  }

  #[test]
  fn multi_day_event_fills_middle_columns() {
    let engine = engine(|_| {});
    let layout = engine
      .layout(&input(
        vec![day(5), day(6), day(7)],
        vec![Event::new("trip", "Away", at(5, 18, 0), at(7, 8, 0))]
      ))
      .expect("layout");

    let middle = &layout.columns[1].rects[0];
    assert!((middle.y - engine.point_y(0, 0)).abs() < EPS);
    assert!(
      (middle.bottom() - engine.point_y(24, 0)).abs() < EPS
    );
    assert!((layout.columns[2].rects[0].y - engine.point_y(0, 0)).abs() < EPS);
  }

  #[test]
  fn malformed_events_fail_layout() {
    let engine = engine(|_| {});
    let result = engine.layout(&input(
      vec![day(5)],
      vec![Event::new("bad", "Bad", at(5, 10, 0), at(5, 9, 0))]
    ));
    assert!(matches!(
      result,
      Err(CalendarError::MalformedEvent { .. })
    ));
  }

  #[test]
  fn empty_dates_give_empty_layout() {
    let engine = engine(|_| {});
    let layout = engine
      .layout(&TimelineInput {
        dates: Vec::new(),
        ..input(vec![day(5)], Vec::new())
      })
      .expect("layout");
    assert!(layout.columns.is_empty());
    assert!(layout.current_time.is_none());
  }

  proptest! {
    #[test]
    fn rectangles_never_overlap(
      raw in prop::collection::vec((0_u32..1380, 5_u32..240), 1..16)
    ) {
      let engine = engine(|_| {});
      let midnight = at(5, 0, 0);
      let events = raw
        .iter()
        .enumerate()
        .map(|(idx, (start, len))| {
          let start = midnight + Duration::minutes(i64::from(*start));
          Event::new(
            format!("e{idx}"),
            "Event",
            start,
            start + Duration::minutes(i64::from(*len))
          )
        })
        .collect::<Vec<_>>();

      let layout = engine
        .layout(&input(vec![day(5)], events))
        .expect("layout");
      let rects = &layout.columns[0].rects;
      for (idx, a) in rects.iter().enumerate() {
        prop_assert!(a.right() <= 400.0 - 3.0 + EPS);
        for b in rects.iter().skip(idx + 1) {
          let apart = a.bottom() <= b.y + EPS
            || b.bottom() <= a.y + EPS
            || a.right() <= b.x + EPS
            || b.right() <= a.x + EPS;
          prop_assert!(
            apart,
            "{:?} overlaps {:?}",
            a.event_id(),
            b.event_id()
          );
        }
      }
    }
  }
}
