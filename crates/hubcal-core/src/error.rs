use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use thiserror::Error;

use crate::event::EventId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalendarError {
  #[error("no grid entry for {what}")]
  LookupMiss {
    what: String
  },

  #[error(
    "cannot project event {id} onto \
     {date}: local time does not exist"
  )]
  InvalidTimeShift {
    id:   EventId,
    date: NaiveDate
  },

  #[error(
    "event {id} ends before it starts \
     (start {start}, end {end})"
  )]
  MalformedEvent {
    id:    EventId,
    start: DateTime<Utc>,
    end:   DateTime<Utc>
  }
}

impl CalendarError {
  pub fn lookup_miss(
    what: impl Into<String>
  ) -> Self {
    Self::LookupMiss {
      what: what.into()
    }
  }
}
