use std::cmp::Ordering;

use chrono::NaiveDate;
use tracing::{
  debug,
  trace
};

use crate::datetime::{
  WeekStart,
  add_days,
  start_of_week
};
use crate::month::Day;

const DAYS_IN_WEEK: usize = 7;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum StripMode {
  Day,
  Week
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum PageChange {
  Previous,
  Next,
  None
}

/// Horizontally paged header strip over
/// whole weeks.
#[derive(Debug, Clone)]
pub struct WeekStrip {
  weeks:       Vec<Vec<Day>>,
  date:        NaiveDate,
  mode:        StripMode,
  week_start:  WeekStart,
  max_days:    usize,
  last_offset: f64
}

impl WeekStrip {
  #[must_use]
  pub fn new(
    weeks: Vec<Vec<Day>>,
    date: NaiveDate,
    mode: StripMode,
    week_start: WeekStart
  ) -> Self {
    Self {
      weeks,
      date,
      mode,
      week_start,
      max_days: DAYS_IN_WEEK,
      last_offset: 0.0
    }
  }

  /// Whole weeks covering `from..=to`,
  /// aligned on `week_start`.
  #[tracing::instrument(skip(mode))]
  pub fn generate(
    from: NaiveDate,
    to: NaiveDate,
    date: NaiveDate,
    mode: StripMode,
    week_start: WeekStart
  ) -> Self {
    let mut weeks = Vec::new();
    let mut cursor =
      start_of_week(from, week_start);
    while cursor <= to {
      weeks.push(
        (0..DAYS_IN_WEEK)
          .map(|offset| {
            Day::real(add_days(
              cursor,
              offset as i64
            ))
          })
          .collect()
      );
      cursor =
        add_days(cursor, DAYS_IN_WEEK as i64);
    }
    debug!(
      weeks = weeks.len(),
      "generated week strip"
    );
    Self::new(weeks, date, mode, week_start)
  }

  /// Visible day count in week mode,
  /// clamped to a full week.
  #[must_use]
  pub fn with_max_days(
    mut self,
    max_days: usize
  ) -> Self {
    self.max_days =
      max_days.clamp(1, DAYS_IN_WEEK);
    self
  }

  #[must_use]
  pub fn date(&self) -> NaiveDate {
    self.date
  }

  #[must_use]
  pub fn mode(&self) -> StripMode {
    self.mode
  }

  #[must_use]
  pub fn weeks(&self) -> &[Vec<Day>] {
    &self.weeks
  }

  #[must_use]
  pub fn last_offset(&self) -> f64 {
    self.last_offset
  }

  pub fn set_date(
    &mut self,
    date: NaiveDate
  ) {
    self.date = date;
  }

  pub fn update_weeks(
    &mut self,
    weeks: Vec<Vec<Day>>
  ) {
    self.weeks = weeks;
  }

  #[must_use]
  pub fn page_size(&self) -> usize {
    match self.mode {
      | StripMode::Week => self.max_days,
      | StripMode::Day => 1
    }
  }

  fn is_full_week(&self) -> bool {
    match self.mode {
      | StripMode::Week => {
        self.max_days == DAYS_IN_WEEK
      }
      | StripMode::Day => true
    }
  }

  /// Weeks are sorted, so the lookup is
  /// a binary search on their bounds.
  #[must_use]
  pub fn page_index_for_date(
    &self,
    date: NaiveDate
  ) -> Option<usize> {
    let idx =
      self.weeks.partition_point(|week| {
        week_bounds(week)
          .is_some_and(|(_, last)| last < date)
      });
    let week = self.weeks.get(idx)?;
    week
      .iter()
      .any(|day| day.date == Some(date))
      .then_some(idx)
  }

  pub fn advance(
    &mut self,
    by_pages: i64
  ) -> NaiveDate {
    let days =
      by_pages * self.page_size() as i64;
    self.date = add_days(self.date, days);
    trace!(by_pages, date = %self.date, "advanced week strip");
    self.date
  }

  /// Release of a drag at
  /// `target_offset`. Equal offsets are a
  /// rubber band and never page.
  pub fn end_dragging(
    &mut self,
    target_offset: f64
  ) -> PageChange {
    let change = match target_offset
      .total_cmp(&self.last_offset)
    {
      | Ordering::Less => {
        self.advance(-1);
        PageChange::Previous
      }
      | Ordering::Greater => {
        self.advance(1);
        PageChange::Next
      }
      | Ordering::Equal => PageChange::None
    };
    self.last_offset = target_offset;
    debug!(?change, date = %self.date, "week strip drag ended");
    change
  }

  pub fn end_scrolling_animation(
    &mut self,
    offset: f64
  ) {
    self.last_offset = offset;
  }

  #[must_use]
  pub fn dates_for_date(
    &self,
    date: NaiveDate
  ) -> Vec<Day> {
    self
      .page_index_for_date(date)
      .and_then(|idx| self.weeks.get(idx))
      .cloned()
      .unwrap_or_default()
  }

  /// Tap on a header cell. Returns the
  /// newly focused date, or `None` when
  /// nothing changed.
  pub fn select(
    &mut self,
    section: usize,
    row: usize
  ) -> Option<NaiveDate> {
    let picked = self
      .weeks
      .get(section)?
      .get(row)?
      .date?;
    if self.mode == StripMode::Day
      && picked == self.date
    {
      return None;
    }
    self.date = picked;
    Some(picked)
  }

  /// First date of the page that shows
  /// `date`.
  #[must_use]
  pub fn scroll_date(
    &self,
    date: NaiveDate
  ) -> NaiveDate {
    if self.is_full_week() {
      start_of_week(date, self.week_start)
    } else {
      date
    }
  }

  /// Date under `x` on the page that
  /// currently shows the focal date.
  #[must_use]
  pub fn date_at_point_x(
    &self,
    x: f64,
    width: f64
  ) -> Option<NaiveDate> {
    if width <= 0.0 || x < 0.0 || x >= width
    {
      return None;
    }
    let columns = if self.is_full_week() {
      DAYS_IN_WEEK
    } else {
      self.max_days
    };
    let column =
      (x / (width / columns as f64)) as usize;
    let first = self.scroll_date(self.date);
    let date =
      add_days(first, column as i64);
    self
      .page_index_for_date(date)
      .map(|_| date)
  }
}

fn week_bounds(
  week: &[Day]
) -> Option<(NaiveDate, NaiveDate)> {
  let first =
    week.iter().find_map(|day| day.date)?;
  let last = week
    .iter()
    .rev()
    .find_map(|day| day.date)?;
  Some((first, last))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, m, d)
      .expect("valid date")
  }

  fn sample_strip(mode: StripMode) -> WeekStrip {
    WeekStrip::generate(
      date(3, 1),
      date(4, 30),
      date(3, 18),
      mode,
      WeekStart::Monday
    )
  }

  #[test]
  fn generated_weeks_are_aligned_and_sorted(
  ) {
    let strip = sample_strip(StripMode::Week);
    let firsts = strip
      .weeks()
      .iter()
      .map(|week| week[0].date.expect("dated"))
      .collect::<Vec<_>>();
    assert_eq!(firsts[0], date(2, 23));
    assert!(
      firsts.windows(2).all(|w| w[0] < w[1])
    );
    assert!(
      strip
        .weeks()
        .iter()
        .all(|week| week.len() == 7)
    );
  }

  #[test]
  fn finds_page_for_date() {
    let strip = sample_strip(StripMode::Week);
    assert_eq!(
      strip.page_index_for_date(date(2, 23)),
      Some(0)
    );
    assert_eq!(
      strip.page_index_for_date(date(3, 18)),
      Some(3)
    );
    assert_eq!(
      strip.page_index_for_date(date(6, 1)),
      None
    );
    let week = strip.dates_for_date(date(3, 18));
    assert_eq!(week.len(), 7);
    assert_eq!(week[0].date, Some(date(3, 16)));
    assert!(
      strip.dates_for_date(date(9, 1)).is_empty()
    );
  }

  #[test]
  fn drag_left_of_last_offset_pages_back() {
    let mut strip = sample_strip(StripMode::Week);
    strip.end_scrolling_animation(100.0);

    assert_eq!(
      strip.end_dragging(80.0),
      PageChange::Previous
    );
    assert_eq!(strip.date(), date(3, 11));
    assert_eq!(strip.last_offset(), 80.0);

    assert_eq!(
      strip.end_dragging(80.0),
      PageChange::None
    );
    assert_eq!(strip.date(), date(3, 11));

    assert_eq!(
      strip.end_dragging(120.0),
      PageChange::Next
    );
    assert_eq!(strip.date(), date(3, 18));
  }

  #[test]
  fn day_mode_pages_one_day() {
    let mut strip = sample_strip(StripMode::Day);
    assert_eq!(strip.advance(1), date(3, 19));
    assert_eq!(strip.advance(-3), date(3, 16));

    let mut week = sample_strip(StripMode::Week)
      .with_max_days(3);
    assert_eq!(week.advance(2), date(3, 24));
  }

  #[test]
  fn reselecting_in_day_mode_is_a_no_op() {
    let mut strip = sample_strip(StripMode::Day);
    // 2026-03-18 is the third cell of
    // the week starting 03-16.
    assert_eq!(strip.select(3, 2), None);
    assert_eq!(
      strip.select(3, 4),
      Some(date(3, 20))
    );
    assert_eq!(strip.select(40, 0), None);

    let mut week = sample_strip(StripMode::Week);
    assert_eq!(
      week.select(3, 2),
      Some(date(3, 18))
    );
  }

  #[test]
  fn maps_point_to_date_on_current_page() {
    let strip = sample_strip(StripMode::Week);
    assert_eq!(
      strip.date_at_point_x(0.0, 700.0),
      Some(date(3, 16))
    );
    assert_eq!(
      strip.date_at_point_x(650.0, 700.0),
      Some(date(3, 22))
    );
    assert_eq!(
      strip.date_at_point_x(800.0, 700.0),
      None
    );

    let partial = sample_strip(StripMode::Week)
      .with_max_days(3);
    assert_eq!(
      partial.scroll_date(date(3, 18)),
      date(3, 18)
    );
  }
}
