use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  Duration,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  TimeZone,
  Timelike,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;
use serde::{
  Deserialize,
  Serialize
};

pub const TIMEZONE_ENV_VAR: &str =
  "HUBCAL_TIMEZONE";
const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
  Sunday,
  #[default]
  Monday
}

impl WeekStart {
  #[must_use]
  pub fn weekday(self) -> Weekday {
    match self {
      | WeekStart::Sunday => Weekday::Sun,
      | WeekStart::Monday => Weekday::Mon
    }
  }

  pub fn parse(raw: &str) -> Option<Self> {
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "sunday" | "sun" => {
        Some(WeekStart::Sunday)
      }
      | "monday" | "mon" => {
        Some(WeekStart::Monday)
      }
      | _ => None
    }
  }
}

/// Calendar context shared by every
/// grid and layout computation: the
/// display timezone plus the week-start
/// convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calendar {
  timezone:   Tz,
  week_start: WeekStart
}

impl Default for Calendar {
  fn default() -> Self {
    Self {
      timezone:   chrono_tz::UTC,
      week_start: WeekStart::Monday
    }
  }
}

impl Calendar {
  #[must_use]
  pub fn new(
    timezone: Tz,
    week_start: WeekStart
  ) -> Self {
    Self {
      timezone,
      week_start
    }
  }

  #[must_use]
  pub fn timezone(&self) -> Tz {
    self.timezone
  }

  #[must_use]
  pub fn week_start(&self) -> WeekStart {
    self.week_start
  }

  #[must_use]
  pub fn with_timezone(
    self,
    timezone: Tz
  ) -> Self {
    Self { timezone, ..self }
  }

  #[must_use]
  pub fn with_week_start(
    self,
    week_start: WeekStart
  ) -> Self {
    Self {
      week_start,
      ..self
    }
  }

  #[must_use]
  pub fn local(
    &self,
    instant: DateTime<Utc>
  ) -> DateTime<Tz> {
    convert_timezone(instant, self.timezone)
  }

  #[must_use]
  pub fn date_of(
    &self,
    instant: DateTime<Utc>
  ) -> NaiveDate {
    self.local(instant).date_naive()
  }

  #[must_use]
  pub fn time_of(
    &self,
    instant: DateTime<Utc>
  ) -> NaiveTime {
    self.local(instant).time()
  }

  #[must_use]
  pub fn same_day(
    &self,
    a: DateTime<Utc>,
    b: DateTime<Utc>
  ) -> bool {
    self.date_of(a) == self.date_of(b)
  }

  #[must_use]
  pub fn same_month(
    &self,
    a: DateTime<Utc>,
    b: DateTime<Utc>
  ) -> bool {
    same_month(
      self.date_of(a),
      self.date_of(b)
    )
  }

  #[must_use]
  pub fn hour(
    &self,
    instant: DateTime<Utc>
  ) -> u32 {
    self.local(instant).hour()
  }

  #[must_use]
  pub fn minute(
    &self,
    instant: DateTime<Utc>
  ) -> u32 {
    self.local(instant).minute()
  }

  #[must_use]
  pub fn day_of_month(
    &self,
    instant: DateTime<Utc>
  ) -> u32 {
    self.local(instant).day()
  }

  #[must_use]
  pub fn month(
    &self,
    instant: DateTime<Utc>
  ) -> u32 {
    self.local(instant).month()
  }

  #[must_use]
  pub fn year(
    &self,
    instant: DateTime<Utc>
  ) -> i32 {
    self.local(instant).year()
  }

  #[must_use]
  pub fn start_of_week(
    &self,
    date: NaiveDate
  ) -> NaiveDate {
    start_of_week(date, self.week_start)
  }

  /// Resolves a wall-clock time in the
  /// calendar timezone. Times skipped by
  /// a DST transition yield `None`;
  /// repeated times resolve to the
  /// earlier instant.
  #[must_use]
  pub fn to_utc(
    &self,
    local: NaiveDateTime
  ) -> Option<DateTime<Utc>> {
    match self
      .timezone
      .from_local_datetime(&local)
    {
      | LocalResult::Single(dt) => {
        Some(dt.with_timezone(&Utc))
      }
      | LocalResult::Ambiguous(
        first,
        second
      ) => {
        tracing::trace!(
          local = %local,
          "ambiguous local datetime; using earliest"
        );
        let chosen = if first <= second {
          first
        } else {
          second
        };
        Some(chosen.with_timezone(&Utc))
      }
      | LocalResult::None => None
    }
  }

  #[must_use]
  pub fn at(
    &self,
    date: NaiveDate,
    time: NaiveTime
  ) -> Option<DateTime<Utc>> {
    self.to_utc(date.and_time(time))
  }

  /// First instant of `date` in the
  /// calendar timezone. Zones that skip
  /// midnight start the day at the first
  /// existing hour.
  #[must_use]
  pub fn start_of_day(
    &self,
    date: NaiveDate
  ) -> DateTime<Utc> {
    (0..3)
      .find_map(|hour| {
        self.at(
          date,
          NaiveTime::from_hms_opt(
            hour, 0, 0
          )?
        )
      })
      .unwrap_or_else(|| {
        DateTime::<Utc>::from_naive_utc_and_offset(
          date.and_time(NaiveTime::MIN),
          Utc
        )
      })
  }

  #[must_use]
  pub fn today(
    &self,
    now: DateTime<Utc>
  ) -> NaiveDate {
    self.date_of(now)
  }
}

#[must_use]
pub fn convert_timezone(
  instant: DateTime<Utc>,
  timezone: Tz
) -> DateTime<Tz> {
  instant.with_timezone(&timezone)
}

#[must_use]
pub fn same_month(
  a: NaiveDate,
  b: NaiveDate
) -> bool {
  a.year() == b.year()
    && a.month() == b.month()
}

#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

#[must_use]
pub fn start_of_week(
  day: NaiveDate,
  week_start: WeekStart
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .weekday()
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

/// Column of `day` in a week that
/// starts on `week_start` (0-based).
#[must_use]
pub fn weekday_column(
  day: NaiveDate,
  week_start: WeekStart
) -> usize {
  (day - start_of_week(day, week_start))
    .num_days() as usize
}

#[must_use]
pub fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

#[must_use]
pub fn last_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  add_days(
    first_day_of_month(
      next_year, next_month
    ),
    -1
  )
}

#[must_use]
pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  last_day_of_month(year, month).day()
}

#[must_use]
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let mut year = date.year();
  let mut month =
    date.month() as i32 + months;

  while month < 1 {
    month += 12;
    year = year.saturating_sub(1);
  }
  while month > 12 {
    month -= 12;
    year = year.saturating_add(1);
  }

  let month = month as u32;
  let day = date
    .day()
    .min(days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .unwrap_or(date)
}

/// Timezone used for display. The
/// environment wins over the config file,
/// which wins over UTC.
pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "config")
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_TIMEZONE,
    "default"
  )
  .unwrap_or(chrono_tz::UTC)
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "configured calendar timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "tomorrow" => {
      return Ok(add_days(today, 1));
    }
    | "yesterday" => {
      return Ok(add_days(today, -1));
    }
    | _ => {}
  }

  if let Some(target) =
    parse_weekday_name(&lower)
  {
    return Ok(next_weekday_date(
      today, target
    ));
  }

  let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwm])$")
    .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let negative = caps
      .name("sign")
      .is_some_and(|m| m.as_str() == "-");
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let num =
      if negative { -num } else { num };

    return match caps
      .name("unit")
      .map(|m| m.as_str())
    {
      | Some("d") => {
        Ok(add_days(today, num))
      }
      | Some("w") => {
        Ok(add_days(today, num * 7))
      }
      | Some("m") => {
        let months = i32::try_from(num)
          .context(
            "relative month offset out \
             of range"
          )?;
        Ok(shift_months(today, months))
      }
      | other => {
        Err(anyhow!(
          "unknown relative unit: \
           {other:?}"
        ))
      }
    };
  }

  NaiveDate::parse_from_str(
    token, "%Y-%m-%d"
  )
  .with_context(|| {
    format!(
      "unrecognized date expression: \
       {input} (supported: \
       today/tomorrow/yesterday, \
       weekday names, +Nd/+Nw/+Nm, \
       YYYY-MM-DD)"
    )
  })
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let from_idx = from
    .weekday()
    .num_days_from_monday()
    as i64;
  let target_idx = target
    .num_days_from_monday()
    as i64;
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  add_days(from, delta)
}
