//! Month grid construction and per-day
//! event assignment.

use std::collections::BTreeSet;

use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};
use tracing::{
  debug,
  warn
};

use crate::datetime::{
  Calendar,
  WeekStart,
  add_days,
  days_in_month,
  first_day_of_month,
  same_month,
  shift_months,
  weekday_column
};
use crate::error::CalendarError;
use crate::event::{
  Event,
  validate_events
};
use crate::recurrence::{
  ExpandOptions,
  expand_for_day
};
use crate::style::{
  ScrollDirection,
  Style
};

pub const COLUMNS_IN_PAGE: usize = 7;
pub const ROWS_IN_PAGE: usize = 6;
pub const MIN_BOX_COUNT: usize = 35;
pub const MAX_BOX_COUNT: usize = 42;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum DayKind {
  Regular,
  Weekend,
  Empty
}

#[derive(Debug, Clone, PartialEq)]
pub struct Day {
  pub date:   Option<NaiveDate>,
  pub kind:   DayKind,
  pub events: Vec<Event>
}

impl Day {
  #[must_use]
  pub fn real(date: NaiveDate) -> Self {
    let kind = match date.weekday() {
      | Weekday::Sat | Weekday::Sun => {
        DayKind::Weekend
      }
      | _ => DayKind::Regular
    };
    Self {
      date: Some(date),
      kind,
      events: Vec::new()
    }
  }

  #[must_use]
  pub fn empty(
    date: Option<NaiveDate>
  ) -> Self {
    Self {
      date,
      kind: DayKind::Empty,
      events: Vec::new()
    }
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.kind == DayKind::Empty
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Month {
  /// First day of the month.
  pub date:  NaiveDate,
  pub days:  Vec<Day>,
  pub weeks: usize
}

impl Month {
  #[must_use]
  pub fn real_days(
    &self
  ) -> impl Iterator<Item = &Day> {
    self.days.iter().filter(|day| {
      !day.is_empty()
    })
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarData {
  pub date:   NaiveDate,
  pub months: Vec<Month>
}

impl CalendarData {
  /// Raw months (real days only) from
  /// the month of `from` through the
  /// month of `to`.
  #[tracing::instrument(skip(calendar))]
  pub fn generate(
    focus: NaiveDate,
    from: NaiveDate,
    to: NaiveDate,
    calendar: &Calendar
  ) -> Self {
    let mut months = Vec::new();
    let mut cursor = first_day_of_month(
      from.year(),
      from.month()
    );
    let last = first_day_of_month(
      to.year(),
      to.month()
    );

    while cursor <= last {
      let count = days_in_month(
        cursor.year(),
        cursor.month()
      ) as usize;
      let days = (0..count)
        .map(|offset| {
          Day::real(add_days(
            cursor,
            offset as i64
          ))
        })
        .collect::<Vec<_>>();
      let lead = weekday_column(
        cursor,
        calendar.week_start()
      );
      months.push(Month {
        date: cursor,
        days,
        weeks: (lead + count)
          .div_ceil(COLUMNS_IN_PAGE)
      });
      cursor = shift_months(cursor, 1);
    }

    debug!(
      months = months.len(),
      "generated raw calendar months"
    );
    Self {
      date: focus,
      months
    }
  }

  /// Prepends padding so the first real
  /// day sits under its weekday column.
  /// Padding cells are stamped with the
  /// dates that precede the first day.
  #[must_use]
  pub fn add_start_empty_days(
    days: Vec<Day>,
    week_start: WeekStart
  ) -> Vec<Day> {
    let Some(first) =
      days.first().and_then(|day| day.date)
    else {
      return days;
    };

    let lead =
      weekday_column(first, week_start);
    let mut padded = (0..lead)
      .map(|idx| {
        Day::empty(Some(Self::offset_date(
          -((lead - idx) as i64),
          first
        )))
      })
      .collect::<Vec<_>>();
    padded.extend(days);
    padded
  }

  #[must_use]
  pub fn offset_date(
    offset: i64,
    to: NaiveDate
  ) -> NaiveDate {
    add_days(to, offset)
  }
}

#[derive(Debug, Clone, Copy)]
pub enum DayLookup<'a> {
  Found {
    day:   &'a Day,
    weeks: usize
  },
  Missing
}

impl<'a> DayLookup<'a> {
  #[must_use]
  pub fn day(&self) -> Option<&'a Day> {
    match self {
      | DayLookup::Found { day, .. } => {
        Some(day)
      }
      | DayLookup::Missing => None
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignedEvents {
  /// Every event displayed in the month,
  /// day by day.
  pub events: Vec<Event>,
  /// Dates of every cell of the month,
  /// padding included.
  pub dates:  Vec<Option<NaiveDate>>
}

#[derive(Debug, Clone)]
pub struct MonthGrid {
  data:           CalendarData,
  calendar:       Calendar,
  options:        ExpandOptions,
  selected_dates: BTreeSet<NaiveDate>,
  days_count:     usize
}

impl MonthGrid {
  #[tracing::instrument(skip_all, fields(months = data.months.len()))]
  pub fn build(
    data: CalendarData,
    calendar: &Calendar,
    style: &Style
  ) -> Self {
    let week_start = calendar.week_start();
    let scroll =
      style.month.scroll_direction;

    let months = data
      .months
      .into_iter()
      .map(|month| {
        pad_month(month, week_start, scroll)
      })
      .collect::<Vec<_>>();
    let days_count = months
      .iter()
      .map(|month| month.days.len())
      .sum();

    debug!(
      days_count,
      ?scroll,
      "built month grid"
    );
    Self {
      data: CalendarData {
        date: data.date,
        months
      },
      calendar: *calendar,
      options: style.expand_options(),
      selected_dates: BTreeSet::new(),
      days_count
    }
  }

  #[must_use]
  pub fn data(&self) -> &CalendarData {
    &self.data
  }

  #[must_use]
  pub fn months(&self) -> &[Month] {
    &self.data.months
  }

  #[must_use]
  pub fn selected_dates(
    &self
  ) -> &BTreeSet<NaiveDate> {
    &self.selected_dates
  }

  #[must_use]
  pub fn month_index(
    &self,
    date: NaiveDate
  ) -> Option<usize> {
    self.data.months.iter().position(
      |month| same_month(month.date, date)
    )
  }

  /// Never panics: a stale index from a
  /// render that raced a data change
  /// yields `Missing`.
  #[must_use]
  pub fn day_at(
    &self,
    section: usize,
    row: usize
  ) -> DayLookup<'_> {
    let Some(month) =
      self.data.months.get(section)
    else {
      return DayLookup::Missing;
    };
    match month.days.get(row) {
      | Some(day) => {
        DayLookup::Found {
          day,
          weeks: month.weeks
        }
      }
      | None => DayLookup::Missing
    }
  }

  #[tracing::instrument(skip(self, events), fields(events = events.len()))]
  pub fn assign_events(
    &mut self,
    events: &[Event],
    date: NaiveDate
  ) -> Result<AssignedEvents, CalendarError>
  {
    validate_events(events)?;

    let Some(section) =
      self.month_index(date)
    else {
      let miss = CalendarError::lookup_miss(
        format!("month of {date}")
      );
      warn!(error = %miss, "skipping event assignment");
      return Ok(AssignedEvents::default());
    };

    let recurring = events
      .iter()
      .filter(|event| event.is_recurring())
      .cloned()
      .collect::<Vec<_>>();
    let calendar = self.calendar;
    let options = self.options;

    let mut displayed = Vec::new();
    let month =
      &mut self.data.months[section];
    for day in &mut month.days {
      day.events.clear();
      let Some(day_date) = day.date else {
        continue;
      };
      if day.kind == DayKind::Empty {
        continue;
      }

      day.events = events_for_day(
        events, &recurring, day_date,
        &calendar, options
      );
      displayed
        .extend(day.events.iter().cloned());
    }

    debug!(
      displayed = displayed.len(),
      month = %month.date,
      "assigned events to month"
    );
    Ok(AssignedEvents {
      events: displayed,
      dates:  month
        .days
        .iter()
        .map(|day| day.date)
        .collect()
    })
  }

  /// Applies a tap on `date` to the
  /// current selection and keeps the
  /// result.
  pub fn select_date(
    &mut self,
    date: NaiveDate
  ) -> &BTreeSet<NaiveDate> {
    self.selected_dates =
      update_selected_dates(
        &self.selected_dates,
        date
      );
    &self.selected_dates
  }

  #[must_use]
  pub fn items_in_page(&self) -> usize {
    COLUMNS_IN_PAGE * ROWS_IN_PAGE
  }

  #[must_use]
  pub fn middle_row_in_page(
    &self
  ) -> usize {
    self.items_in_page() / 2
  }

  #[must_use]
  pub fn columns(&self) -> usize {
    let items = self.items_in_page();
    (self.days_count / items)
      * COLUMNS_IN_PAGE
      + self.days_count % items
  }
}

fn pad_month(
  month: Month,
  week_start: WeekStart,
  scroll: ScrollDirection
) -> Month {
  let mut days =
    CalendarData::add_start_empty_days(
      month.days,
      week_start
    );

  let box_count = match month.weeks {
    | 5 if scroll
      == ScrollDirection::Vertical =>
    {
      MIN_BOX_COUNT
    }
    | _ => MAX_BOX_COUNT
  };

  if let Some(last) =
    days.last().and_then(|day| day.date)
    && days.len() < box_count
  {
    let missing = box_count - days.len();
    days.extend((1..=missing).map(|idx| {
      Day::empty(Some(
        CalendarData::offset_date(
          idx as i64, last
        )
      ))
    }));
  }

  let weeks =
    days.len().div_ceil(COLUMNS_IN_PAGE);
  Month {
    date: month.date,
    days,
    weeks
  }
}

/// All-day events first, then timed
/// events by start hour. Recurring
/// events only enter through projection.
fn events_for_day(
  events: &[Event],
  recurring: &[Event],
  date: NaiveDate,
  calendar: &Calendar,
  options: ExpandOptions
) -> Vec<Event> {
  let explicit = events
    .iter()
    .filter(|event| {
      !event.is_recurring()
        && event.touches(date, calendar)
    })
    .cloned()
    .collect::<Vec<_>>();

  let projections = expand_for_day(
    recurring, &explicit, date, calendar,
    options
  );

  let (mut all_day, mut timed): (
    Vec<Event>,
    Vec<Event>
  ) = explicit
    .into_iter()
    .chain(projections)
    .partition(|event| event.is_all_day);

  timed.sort_by_key(|event| {
    calendar.hour(event.start)
  });
  all_day.append(&mut timed);
  all_day
}

/// Range selection confined to one
/// month.
#[must_use]
pub fn update_selected_dates(
  current: &BTreeSet<NaiveDate>,
  date: NaiveDate
) -> BTreeSet<NaiveDate> {
  if current
    .iter()
    .any(|selected| !same_month(*selected, date))
  {
    return BTreeSet::from([date]);
  }

  if current.contains(&date) {
    let mut next = current.clone();
    next.remove(&date);
    return next;
  }

  match (current.first(), current.last())
  {
    | (Some(first), _) if date < *first => {
      BTreeSet::from([date])
    }
    | (_, Some(last)) if date > *last => {
      let span = (date - *last).num_days();
      let mut next = current.clone();
      next.extend(
        (1..=span)
          .map(|offset| add_days(*last, offset))
      );
      next
    }
    | (Some(_), Some(_)) => {
      let mut next = current
        .iter()
        .copied()
        .filter(|selected| *selected < date)
        .collect::<BTreeSet<_>>();
      next.insert(date);
      next
    }
    | _ => BTreeSet::from([date])
  }
}

/// Date to focus after paging to
/// `month`: the same day number, else
/// the day before, else the last day of
/// February, else the first of the
/// month.
#[must_use]
pub fn find_next_date_in_month(
  month: &Month,
  current: NaiveDate
) -> NaiveDate {
  let find_day = |day_number: u32| {
    month.real_days().find_map(|day| {
      day.date.filter(|date| {
        same_month(*date, month.date)
          && date.day() == day_number
      })
    })
  };

  if let Some(date) = find_day(current.day())
  {
    return date;
  }
  if let Some(date) = current
    .day()
    .checked_sub(1)
    .and_then(find_day)
  {
    return date;
  }
  if month.date.month() == 2
    && let Some(date) = month
      .real_days()
      .last()
      .and_then(|day| day.date)
  {
    return date;
  }
  month.date
}
