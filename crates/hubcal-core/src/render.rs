use std::collections::BTreeSet;
use std::io::{self, IsTerminal, Write};

use chrono::{Datelike, NaiveDate};
use unicode_width::UnicodeWidthStr;

use crate::datetime::{Calendar, WeekStart};
use crate::event::Event;
use crate::home::{Device, schedule_time_label};
use crate::month::{COLUMNS_IN_PAGE, DayKind, Month};
use crate::timeline::{StubPosition, TimelineLayout};
use crate::week_strip::{PageChange, WeekStrip};

pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn print_month(
        &self,
        month: &Month,
        selected: &BTreeSet<NaiveDate>,
        today: NaiveDate,
        calendar: &Calendar,
    ) -> anyhow::Result<()> {
        let stdout = io::stdout();
        self.write_month(stdout.lock(), month, selected, today, calendar)
    }

    pub fn write_month<W: Write>(
        &self,
        mut out: W,
        month: &Month,
        selected: &BTreeSet<NaiveDate>,
        today: NaiveDate,
        calendar: &Calendar,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&month.date.format("%B %Y").to_string(), "1"))?;
        writeln!(out, "{}", weekday_header(calendar.week_start()))?;

        for week in month.days.chunks(COLUMNS_IN_PAGE) {
            let cells = week
                .iter()
                .map(|day| match day.date {
                    Some(date) if day.kind != DayKind::Empty => {
                        let marker = if day.events.is_empty() { ' ' } else { '*' };
                        let text = format!("{:>3}{marker}", date.day());
                        if selected.contains(&date) {
                            self.paint(&text, "7")
                        } else if date == today {
                            self.paint(&text, "1;4")
                        } else if day.kind == DayKind::Weekend {
                            self.paint(&text, "2")
                        } else {
                            text
                        }
                    }
                    _ => "    ".to_string(),
                })
                .collect::<Vec<_>>();
            writeln!(out, "{}", cells.join(" ").trim_end())?;
        }
        writeln!(out)?;

        let rows = month
            .real_days()
            .flat_map(|day| {
                let date = day.date;
                day.events.iter().map(move |event| (date, event))
            })
            .filter_map(|(date, event)| {
                let date = date?;
                Some(vec![
                    date.format("%a %d").to_string(),
                    time_span(event, calendar),
                    self.title(event),
                    event.device_name.clone(),
                ])
            })
            .collect::<Vec<_>>();

        if rows.is_empty() {
            writeln!(out, "No schedules this month.")?;
            return Ok(());
        }
        write_table(&mut out, &["Day", "Time", "Title", "Device"], rows)
    }

    pub fn print_timeline(
        &self,
        layout: &TimelineLayout,
        calendar: &Calendar,
    ) -> anyhow::Result<()> {
        let stdout = io::stdout();
        self.write_timeline(stdout.lock(), layout, calendar)
    }

    pub fn write_timeline<W: Write>(
        &self,
        mut out: W,
        layout: &TimelineLayout,
        calendar: &Calendar,
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "Hours {:02}:00-{:02}:00, content height {:.1}",
            layout.start_hour, layout.end_hour, layout.content_height
        )?;

        if let Some(band) = &layout.all_day_band {
            writeln!(
                out,
                "All-day band: height {:.1}, up to {} events{}",
                band.height,
                band.max_events,
                if band.is_pinned { ", pinned" } else { "" }
            )?;
        }

        let mut rows = Vec::new();
        for column in &layout.columns {
            let date = column.date.format("%a %m-%d").to_string();
            for event in &column.all_day {
                rows.push(vec![
                    date.clone(),
                    "all day".to_string(),
                    self.title(event),
                    event.device_name.clone(),
                    String::new(),
                    String::new(),
                    String::new(),
                ]);
            }
            for rect in &column.rects {
                rows.push(vec![
                    date.clone(),
                    time_span(&rect.event, calendar),
                    self.title(&rect.event),
                    rect.event.device_name.clone(),
                    format!("{}/{}", rect.lane + 1, rect.lanes),
                    format!("{:.1}", column.x + rect.x),
                    format!("{:.1}+{:.1}", rect.y, rect.height),
                ]);
            }
            for stub in &column.stubs {
                let label = match stub.position {
                    StubPosition::Top => "above",
                    StubPosition::Bottom => "below",
                };
                let ids = stub
                    .event_ids
                    .iter()
                    .map(|id| id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                rows.push(vec![
                    date.clone(),
                    label.to_string(),
                    self.paint(&ids, "2"),
                    String::new(),
                    String::new(),
                    String::new(),
                    format!("{:.1}", stub.y),
                ]);
            }
        }

        if rows.is_empty() {
            writeln!(out, "No schedules in view.")?;
        } else {
            write_table(&mut out, &["Day", "Time", "Title", "Device", "Lane", "X", "Y"], rows)?;
        }

        if let Some(marker) = &layout.current_time {
            writeln!(
                out,
                "{} {} at x {:.1}, y {:.1}",
                self.paint("now", "31"),
                marker.time.format("%H:%M"),
                marker.x,
                marker.y
            )?;
        }
        Ok(())
    }

    pub fn print_segments(&self, events: &[Event], calendar: &Calendar) -> anyhow::Result<()> {
        if events.is_empty() {
            println!("Nothing on that day.");
            return Ok(());
        }
        let rows = events
            .iter()
            .map(|event| {
                vec![
                    calendar.date_of(event.start).to_string(),
                    time_span(event, calendar),
                    calendar.date_of(event.end).to_string(),
                ]
            })
            .collect();
        write_table(io::stdout().lock(), &["Start day", "Time", "End day"], rows)
    }

    pub fn print_selection(&self, tapped: NaiveDate, selected: &BTreeSet<NaiveDate>) {
        let dates = selected
            .iter()
            .map(|date| date.to_string())
            .collect::<Vec<_>>();
        println!(
            "tap {tapped} -> [{}]",
            if dates.is_empty() {
                self.paint("none", "2")
            } else {
                dates.join(", ")
            }
        );
    }

    pub fn print_strip(&self, change: PageChange, strip: &WeekStrip) {
        let page = strip
            .dates_for_date(strip.date())
            .iter()
            .filter_map(|day| day.date)
            .map(|date| {
                let text = date.format("%a %d").to_string();
                if date == strip.date() {
                    self.paint(&text, "7")
                } else {
                    text
                }
            })
            .collect::<Vec<_>>();
        println!("{change:?}: focus {}", strip.date());
        println!("{}", page.join("  "));
    }

    pub fn print_schedules(&self, events: &[Event], calendar: &Calendar) -> anyhow::Result<()> {
        if events.is_empty() {
            println!("No schedules.");
            return Ok(());
        }
        let rows = events
            .iter()
            .map(|event| {
                vec![
                    event.id.to_string(),
                    event.device_name.clone(),
                    self.title(event),
                    schedule_time_label(event, calendar),
                    if event.is_recurring() {
                        self.paint("daily", "36")
                    } else {
                        "once".to_string()
                    },
                ]
            })
            .collect();
        write_table(
            io::stdout().lock(),
            &["ID", "Owner", "Title", "When", "Repeats"],
            rows,
        )
    }

    pub fn print_devices<'a, I>(&self, groups: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = (String, Vec<&'a Device>)>,
    {
        let mut out = io::stdout().lock();
        for (heading, devices) in groups {
            writeln!(out, "{}", self.paint(&heading, "1"))?;
            let rows = devices
                .iter()
                .map(|device| {
                    vec![
                        device.name.clone(),
                        device.brand.clone(),
                        device.room.clone(),
                        device.category.display_name().to_string(),
                        device
                            .average_usage()
                            .map(|watts| format!("{watts:.1} W"))
                            .unwrap_or_default(),
                        device.schedule.len().to_string(),
                    ]
                })
                .collect();
            write_table(
                &mut out,
                &["Name", "Brand", "Room", "Category", "Avg usage", "Schedules"],
                rows,
            )?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn title(&self, event: &Event) -> String {
        let text = if event.title.list.is_empty() {
            event.title.timeline.as_str()
        } else {
            event.title.list.as_str()
        };
        if event.is_recurring() {
            self.paint(text, "36")
        } else {
            self.paint(text, "34")
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn weekday_header(week_start: WeekStart) -> String {
    let mut day = week_start.weekday();
    let mut names = Vec::with_capacity(COLUMNS_IN_PAGE);
    for _ in 0..COLUMNS_IN_PAGE {
        names.push(format!("{:>4}", day.to_string()));
        day = day.succ();
    }
    names.join(" ")
}

fn time_span(event: &Event, calendar: &Calendar) -> String {
    if event.is_all_day {
        return "all day".to_string();
    }
    format!(
        "{}-{}",
        calendar.time_of(event.start).format("%H:%M"),
        calendar.time_of(event.end).format("%H:%M")
    )
}

fn write_table<W: Write>(
    mut writer: W,
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(*header))
        .collect::<Vec<_>>();

    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(visible_width(cell));
        }
    }

    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| format!("{header:width$}"))
        .collect::<Vec<_>>();
    writeln!(writer, "{}", header_line.join(" ").trim_end())?;

    let rule = widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>();
    writeln!(writer, "{}", rule.join(" "))?;

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let padding = width.saturating_sub(visible_width(cell));
                format!("{cell}{}", " ".repeat(padding))
            })
            .collect::<Vec<_>>();
        writeln!(writer, "{}", line.join(" ").trim_end())?;
    }

    Ok(())
}

fn visible_width(cell: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(cell).as_str())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            escaped = ch != 'm';
            continue;
        }
        if ch == '\x1b' {
            escaped = true;
            continue;
        }
        out.push(ch);
    }

    out
}
