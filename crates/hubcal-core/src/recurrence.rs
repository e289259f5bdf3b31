//! Projection of recurring schedules
//! onto concrete calendar dates.
//!
//! Projections are derived values: they
//! keep the source event's id so callers
//! can dedup against explicit events, and
//! they are never written back anywhere.

use chrono::NaiveDate;

use crate::datetime::{
  Calendar,
  add_days
};
use crate::error::CalendarError;
use crate::event::{
  Event,
  Recurrence
};

#[derive(
  Debug, Clone, Copy, Default, PartialEq,
)]
pub struct ExpandOptions {
  pub show_recurring_event_in_past: bool
}

/// Moves `event` onto `date`, keeping
/// its local time-of-day and its exact
/// duration.
pub fn project_onto(
  event: &Event,
  date: NaiveDate,
  calendar: &Calendar
) -> Result<Event, CalendarError> {
  let start_time =
    calendar.time_of(event.start);
  let start = calendar
    .at(date, start_time)
    .ok_or_else(|| {
      CalendarError::InvalidTimeShift {
        id: event.id.clone(),
        date
      }
    })?;

  Ok(Event {
    start,
    end: start + event.duration(),
    ..event.clone()
  })
}

/// Whether the event crosses into the
/// following day. Ending exactly at
/// midnight does not count.
#[must_use]
pub fn is_overnight(
  event: &Event,
  calendar: &Calendar
) -> bool {
  let start_day =
    calendar.date_of(event.start);
  let end_day =
    calendar.date_of(event.end);
  end_day > start_day
    && event.end
      > calendar.start_of_day(end_day)
}

/// Everything `event` contributes to
/// `date`: nothing, the event itself, a
/// projection, or a projection plus the
/// previous day's projection whose tail
/// reaches into `date`.
pub fn expand(
  event: &Event,
  date: NaiveDate,
  calendar: &Calendar,
  options: ExpandOptions
) -> Vec<Event> {
  match event.recurrence {
    | Recurrence::None => {
      if event.starts_on(date, calendar)
      {
        vec![event.clone()]
      } else {
        Vec::new()
      }
    }
    | Recurrence::EveryDay => {
      if !projectable(
        event, date, calendar, options
      ) {
        return Vec::new();
      }

      let Some(head) = project_logged(
        event, date, calendar
      ) else {
        return Vec::new();
      };

      let overnight =
        is_overnight(&head, calendar);
      let mut result = vec![head];

      let previous = add_days(date, -1);
      if overnight
        && projectable(
          event, previous, calendar,
          options
        )
        && let Some(tail) =
          project_logged(
            event, previous, calendar
          )
      {
        result.push(tail);
      }

      result
    }
  }
}

/// Recurring projections for one day,
/// skipping any recurring event whose id
/// already appears among the explicit
/// events of that day.
#[tracing::instrument(
  level = "trace",
  skip(recurring, explicit, calendar),
  fields(recurring = recurring.len())
)]
pub fn expand_for_day(
  recurring: &[Event],
  explicit: &[Event],
  date: NaiveDate,
  calendar: &Calendar,
  options: ExpandOptions
) -> Vec<Event> {
  recurring
    .iter()
    .filter(|event| {
      !explicit
        .iter()
        .any(|other| other.id == event.id)
    })
    .flat_map(|event| {
      expand(
        event, date, calendar, options
      )
    })
    .collect()
}

fn projectable(
  event: &Event,
  date: NaiveDate,
  calendar: &Calendar,
  options: ExpandOptions
) -> bool {
  options.show_recurring_event_in_past
    || date >= calendar.date_of(event.start)
}

fn project_logged(
  event: &Event,
  date: NaiveDate,
  calendar: &Calendar
) -> Option<Event> {
  match project_onto(event, date, calendar)
  {
    | Ok(projected) => Some(projected),
    | Err(err) => {
      tracing::warn!(
        id = %event.id,
        %date,
        error = %err,
        "dropping recurring projection"
      );
      None
    }
  }
}
