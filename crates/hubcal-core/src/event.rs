use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::datetime::Calendar;
use crate::error::CalendarError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    EveryDay,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventTitle {
    #[serde(default)]
    pub timeline: String,
    #[serde(default)]
    pub list: String,
}

impl EventTitle {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            timeline: text.clone(),
            list: text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct EventColor(pub String);

impl EventColor {
    pub fn cyan() -> Self {
        Self("#32ade6".to_string())
    }

    pub fn blue() -> Self {
        Self("#007aff".to_string())
    }
}

impl Default for EventColor {
    fn default() -> Self {
        Self::blue()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventStyle {
    #[serde(default)]
    pub default_width: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: EventId,

    #[serde(default)]
    pub title: EventTitle,

    pub start: DateTime<Utc>,

    pub end: DateTime<Utc>,

    #[serde(default)]
    pub is_all_day: bool,

    #[serde(default)]
    pub recurrence: Recurrence,

    #[serde(default)]
    pub color: EventColor,

    #[serde(default)]
    pub device_name: String,

    #[serde(default)]
    pub style: Option<EventStyle>,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EventId::new(id),
            title: EventTitle::new(title),
            start,
            end,
            is_all_day: false,
            recurrence: Recurrence::None,
            color: EventColor::default(),
            device_name: String::new(),
            style: None,
        }
    }

    pub fn repeating_daily(mut self) -> Self {
        self.recurrence = Recurrence::EveryDay;
        self.color = EventColor::cyan();
        self
    }

    pub fn all_day(mut self) -> Self {
        self.is_all_day = true;
        self
    }

    pub fn for_device(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = device_name.into();
        self
    }

    pub fn with_default_width(mut self, width: f64) -> Self {
        self.style = Some(EventStyle {
            default_width: Some(width),
        });
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence != Recurrence::None
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn default_width(&self) -> Option<f64> {
        self.style.as_ref().and_then(|style| style.default_width)
    }

    pub fn validate(&self) -> Result<(), CalendarError> {
        if self.start >= self.end {
            return Err(CalendarError::MalformedEvent {
                id: self.id.clone(),
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn starts_on(&self, date: NaiveDate, calendar: &Calendar) -> bool {
        calendar.date_of(self.start) == date
    }

    /// An event that ends exactly at midnight does not occupy the day it ends on.
    pub fn ends_on(&self, date: NaiveDate, calendar: &Calendar) -> bool {
        calendar.date_of(self.end) == date && self.end > calendar.start_of_day(date)
    }

    /// Multi-day events pass through every day strictly between their start and end days.
    pub fn spans(&self, date: NaiveDate, calendar: &Calendar) -> bool {
        calendar.date_of(self.start) < date && date < calendar.date_of(self.end)
    }

    pub fn touches(&self, date: NaiveDate, calendar: &Calendar) -> bool {
        self.starts_on(date, calendar) || self.ends_on(date, calendar) || self.spans(date, calendar)
    }
}

pub fn validate_events(events: &[Event]) -> Result<(), CalendarError> {
    for event in events {
        event.validate().inspect_err(|err| {
            tracing::warn!(id = %event.id, error = %err, "rejecting malformed event");
        })?;
    }
    Ok(())
}

/// Splits events into timed and all-day, preserving input order.
pub fn split_events<'a, I>(events: I) -> (Vec<Event>, Vec<Event>)
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .cloned()
        .partition(|event| !event.is_all_day)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, h, m, 0)
            .single()
            .expect("valid instant")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).expect("valid date")
    }

    #[test]
    fn rejects_events_that_do_not_move_forward() {
        let inverted = Event::new("a", "Inverted", at(5, 10, 0), at(5, 9, 0));
        let empty = Event::new("b", "Empty", at(5, 10, 0), at(5, 10, 0));
        assert!(matches!(
            inverted.validate(),
            Err(CalendarError::MalformedEvent { .. })
        ));
        assert!(empty.validate().is_err());
        let fine = Event::new("c", "Ok", at(5, 9, 0), at(5, 10, 0));
        assert!(validate_events(&[fine, empty]).is_err());
    }

    #[test]
    fn day_membership_covers_start_end_and_pass_through() {
        let calendar = Calendar::default();
        let trip = Event::new("trip", "Away mode", at(3, 18, 0), at(6, 8, 0));
        assert!(trip.starts_on(day(3), &calendar));
        assert!(trip.spans(day(4), &calendar));
        assert!(trip.spans(day(5), &calendar));
        assert!(trip.ends_on(day(6), &calendar));
        assert!(!trip.touches(day(7), &calendar));
        assert!(!trip.touches(day(2), &calendar));
    }

    #[test]
    fn ending_at_midnight_does_not_touch_next_day() {
        let calendar = Calendar::default();
        let late = Event::new("late", "Lights off", at(5, 23, 0), at(6, 0, 0));
        assert!(late.touches(day(5), &calendar));
        assert!(!late.touches(day(6), &calendar));
    }

    #[test]
    fn split_keeps_order_within_each_group() {
        let events = vec![
            Event::new("1", "a", at(5, 9, 0), at(5, 10, 0)),
            Event::new("2", "b", at(5, 0, 0), at(5, 23, 0)).all_day(),
            Event::new("3", "c", at(5, 7, 0), at(5, 8, 0)),
        ];
        let (timed, all_day) = split_events(&events);
        let ids: Vec<_> = timed.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(all_day.len(), 1);
    }

    #[test]
    fn events_deserialize_with_defaults() {
        let raw = concat!(
            r#"{"id":"x","start":"2026-03-05T09:00:00Z","#,
            r#""end":"2026-03-05T10:00:00Z","recurrence":"every_day"}"#
        );
        let event: Event = serde_json::from_str(raw).expect("parse event");
        assert_eq!(event.recurrence, Recurrence::EveryDay);
        assert!(!event.is_all_day);
        assert_eq!(event.duration(), Duration::hours(1));
    }
}
