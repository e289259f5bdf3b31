use std::collections::BTreeMap;

use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, instrument};

use crate::cli::Invocation;
use crate::datetime::{Calendar, add_days, first_day_of_month, parse_date_expr, shift_months};
use crate::event::Event;
use crate::home::{Home, ScheduleDraft};
use crate::month::{CalendarData, MonthGrid, find_next_date_in_month};
use crate::recurrence::expand;
use crate::render::Renderer;
use crate::scheduler::CurrentTimeTicker;
use crate::store::EventStore;
use crate::style::Style;
use crate::timeline::{TimelineEngine, TimelineInput, Viewport};
use crate::week_strip::{StripMode, WeekStrip};

const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 450.0,
    height: 800.0,
};

/// Weeks generated on either side of the focus date for paging.
const STRIP_WEEKS_AROUND: i64 = 4;

const VALUE_FLAGS: &[&str] = &[
    "by", "device", "follow", "height", "last", "mode", "shift", "target", "title", "width", "x",
];

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "month",
        "week",
        "day",
        "expand",
        "select",
        "page",
        "schedules",
        "devices",
        "add",
        "show",
        "commands",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Everything a command needs: the effective style, the clock, and where
/// schedules come from.
pub struct Session {
    pub style: Style,
    pub calendar: Calendar,
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
    pub focus: NaiveDate,
    pub home: Home,
    pub store: Option<EventStore>,
}

impl Session {
    pub fn new(
        style: Style,
        now: DateTime<Utc>,
        focus: Option<&str>,
        store: Option<EventStore>,
    ) -> anyhow::Result<Self> {
        let calendar = style.calendar();
        let today = calendar.today(now);
        let focus = match focus {
            Some(expr) => parse_date_expr(expr, today)
                .with_context(|| format!("invalid --date value: {expr}"))?,
            None => today,
        };
        Ok(Self {
            home: Home::mock(today, &calendar),
            style,
            calendar,
            now,
            today,
            focus,
            store,
        })
    }

    /// Schedules from the events file when one is configured, otherwise the
    /// demo home's.
    pub fn events(&self) -> anyhow::Result<Vec<Event>> {
        match &self.store {
            Some(store) => store.load(),
            None => Ok(self.home.all_events()),
        }
    }

    fn date_arg(&self, token: &str) -> anyhow::Result<NaiveDate> {
        parse_date_expr(token, self.today).with_context(|| format!("invalid date: {token}"))
    }
}

#[derive(Debug, Default)]
struct CommandArgs {
    positionals: Vec<String>,
    flags: BTreeMap<String, Option<String>>,
}

impl CommandArgs {
    fn parse(args: &[String]) -> Self {
        let mut out = Self::default();
        let mut iter = args.iter().peekable();
        while let Some(arg) = iter.next() {
            let Some(name) = arg.strip_prefix("--") else {
                out.positionals.push(arg.clone());
                continue;
            };
            let value = if VALUE_FLAGS.contains(&name) {
                iter.next_if(|next| !next.starts_with("--")).cloned()
            } else {
                None
            };
            out.flags.insert(name.to_string(), value);
        }
        out
    }

    fn has(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    fn value(&self, name: &str) -> Option<&str> {
        self.flags.get(name).and_then(|value| value.as_deref())
    }

    fn number<T>(&self, name: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.value(name)
            .map(|raw| raw.parse::<T>().with_context(|| format!("invalid --{name} value: {raw}")))
            .transpose()
    }

    fn viewport(&self) -> anyhow::Result<Viewport> {
        Ok(Viewport {
            width: self.number("width")?.unwrap_or(DEFAULT_VIEWPORT.width),
            height: self.number("height")?.unwrap_or(DEFAULT_VIEWPORT.height),
        })
    }
}

#[instrument(skip(session, renderer, inv))]
pub fn dispatch(session: &mut Session, renderer: &Renderer, inv: Invocation) -> anyhow::Result<()> {
    let command = inv.command.as_str();
    let args = CommandArgs::parse(&inv.command_args);

    debug!(command, args = ?inv.command_args, focus = %session.focus, "dispatching command");

    match command {
        "month" => cmd_month(session, renderer, &args),
        "week" => cmd_timeline(session, renderer, &args, StripMode::Week),
        "day" => cmd_timeline(session, renderer, &args, StripMode::Day),
        "expand" => cmd_expand(session, renderer, &args),
        "select" => cmd_select(session, renderer, &args),
        "page" => cmd_page(session, renderer, &args),
        "schedules" => cmd_schedules(session, renderer, &args),
        "devices" => cmd_devices(session, renderer, &args),
        "add" => cmd_add(session, renderer, &args),
        "show" => cmd_show(&session.style),
        "commands" => {
            for command in known_command_names() {
                println!("{command}");
            }
            Ok(())
        }
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(session, renderer, args))]
fn cmd_month(session: &Session, renderer: &Renderer, args: &CommandArgs) -> anyhow::Result<()> {
    info!("command month");

    let shift = args.number::<i32>("shift")?.unwrap_or(0);
    let focus = session.focus;
    let target = shift_months(first_day_of_month(focus.year(), focus.month()), shift);
    let (from, to) = if target < focus { (target, focus) } else { (focus, target) };

    let data = CalendarData::generate(focus, from, to, &session.calendar);
    let mut grid = MonthGrid::build(data, &session.calendar, &session.style);
    let section = grid
        .month_index(target)
        .ok_or_else(|| anyhow!("no month generated for {target}"))?;
    let date = find_next_date_in_month(&grid.months()[section], focus);

    let events = session.events()?;
    let assigned = grid.assign_events(&events, date)?;
    debug!(date = %date, shown = assigned.events.len(), "month ready");

    let selected = grid.select_date(date).clone();
    renderer.print_month(&grid.months()[section], &selected, session.today, &session.calendar)
}

#[instrument(skip(session, renderer, args))]
fn cmd_timeline(
    session: &Session,
    renderer: &Renderer,
    args: &CommandArgs,
    mode: StripMode,
) -> anyhow::Result<()> {
    info!(?mode, "command timeline");

    let viewport = args.viewport()?;
    if let Some(ticks) = args.number::<u32>("follow")? {
        return follow_timeline(session, renderer, mode, viewport, ticks);
    }
    render_timeline(session, renderer, mode, viewport, session.now)
}

fn render_timeline(
    session: &Session,
    renderer: &Renderer,
    mode: StripMode,
    viewport: Viewport,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let input = TimelineInput {
        dates: visible_dates(session, mode),
        events: session.events()?,
        recurring_events: Vec::new(),
        selected_date: session.focus,
        viewport,
        now,
    };
    let engine = TimelineEngine::new(session.style.clone(), session.calendar);
    let layout = engine.layout(&input)?;
    renderer.print_timeline(&layout, &session.calendar)
}

/// Re-renders on every wall-clock minute until `ticks` renders happened.
fn follow_timeline(
    session: &Session,
    renderer: &Renderer,
    mode: StripMode,
    viewport: Viewport,
    ticks: u32,
) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start the clock runtime")?;

    runtime.block_on(async {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let ticker = CurrentTimeTicker::spawn_minute_aligned(session.now, move |now| {
            if tx.send(now).is_err() {
                debug!("timeline follower gone, dropping tick");
            }
        });

        render_timeline(session, renderer, mode, viewport, session.now)?;
        for _ in 0..ticks {
            let Some(now) = rx.recv().await else {
                break;
            };
            println!();
            render_timeline(session, renderer, mode, viewport, now)?;
        }
        ticker.cancel();
        Ok::<(), anyhow::Error>(())
    })
}

fn visible_dates(session: &Session, mode: StripMode) -> Vec<NaiveDate> {
    let focus = session.focus;
    let strip = WeekStrip::generate(focus, focus, focus, mode, session.calendar.week_start())
        .with_max_days(session.style.week.max_days);
    let first = match mode {
        StripMode::Week => strip.scroll_date(focus),
        StripMode::Day => focus,
    };
    (0..strip.page_size())
        .map(|offset| add_days(first, offset as i64))
        .collect()
}

#[instrument(skip(session, renderer, args))]
fn cmd_expand(session: &Session, renderer: &Renderer, args: &CommandArgs) -> anyhow::Result<()> {
    info!("command expand");

    let Some(id) = args.positionals.first() else {
        bail!("usage: hubcal expand <schedule-id> [date]");
    };
    let date = match args.positionals.get(1) {
        Some(token) => session.date_arg(token)?,
        None => session.focus,
    };

    let events = session.events()?;
    let event = events
        .iter()
        .find(|event| event.id.as_str() == id)
        .ok_or_else(|| anyhow!("no schedule with id {id}"))?;

    let segments = expand(event, date, &session.calendar, session.style.expand_options());
    debug!(id = %event.id, %date, segments = segments.len(), "expanded schedule");
    renderer.print_segments(&segments, &session.calendar)
}

#[instrument(skip(session, renderer, args))]
fn cmd_select(session: &Session, renderer: &Renderer, args: &CommandArgs) -> anyhow::Result<()> {
    info!("command select");

    let taps = args
        .positionals
        .iter()
        .map(|token| session.date_arg(token))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let (Some(from), Some(to)) = (taps.iter().min(), taps.iter().max()) else {
        bail!("usage: hubcal select <date>...");
    };

    let data = CalendarData::generate(session.focus, *from, *to, &session.calendar);
    let mut grid = MonthGrid::build(data, &session.calendar, &session.style);
    for tap in &taps {
        let selected = grid.select_date(*tap);
        renderer.print_selection(*tap, selected);
    }
    Ok(())
}

#[instrument(skip(session, renderer, args))]
fn cmd_page(session: &Session, renderer: &Renderer, args: &CommandArgs) -> anyhow::Result<()> {
    info!("command page");

    let mode = match args.value("mode").unwrap_or("week") {
        "week" => StripMode::Week,
        "day" => StripMode::Day,
        other => bail!("unknown strip mode: {other} (expected day or week)"),
    };
    let focus = session.focus;
    let mut strip = WeekStrip::generate(
        add_days(focus, -7 * STRIP_WEEKS_AROUND),
        add_days(focus, 7 * STRIP_WEEKS_AROUND),
        focus,
        mode,
        session.calendar.week_start(),
    )
    .with_max_days(session.style.week.max_days);

    if let Some(x) = args.number::<f64>("x")? {
        let width = args.number::<f64>("width")?.unwrap_or(DEFAULT_VIEWPORT.width);
        match strip.date_at_point_x(x, width) {
            Some(date) => println!("x {x:.1} -> {date}"),
            None => println!("x {x:.1} is outside the strip"),
        }
        return Ok(());
    }

    let last = args.number::<f64>("last")?.unwrap_or(0.0);
    let target = args.number::<f64>("target")?.ok_or_else(|| {
        anyhow!("usage: hubcal page --target <offset> [--last <offset>] [--mode day|week]")
    })?;
    strip.end_scrolling_animation(last);
    let change = strip.end_dragging(target);
    renderer.print_strip(change, &strip);
    Ok(())
}

#[instrument(skip(session, renderer, args))]
fn cmd_schedules(session: &Session, renderer: &Renderer, args: &CommandArgs) -> anyhow::Result<()> {
    info!("command schedules");

    let events = session.events()?;
    let events = match args.value("device") {
        Some(owner) => events
            .into_iter()
            .filter(|event| event.device_name.eq_ignore_ascii_case(owner))
            .collect(),
        None => events,
    };
    renderer.print_schedules(&events, &session.calendar)
}

#[instrument(skip(session, renderer, args))]
fn cmd_devices(session: &Session, renderer: &Renderer, args: &CommandArgs) -> anyhow::Result<()> {
    info!("command devices");

    let home = &session.home;
    match args.value("by").unwrap_or("room") {
        "room" => renderer.print_devices(
            home.devices_by_room()
                .into_iter()
                .map(|(room, devices)| (room.to_string(), devices)),
        ),
        "category" => renderer.print_devices(
            home.devices_by_category()
                .into_iter()
                .map(|(category, devices)| (category.display_name().to_string(), devices)),
        ),
        other => bail!("cannot group devices by {other} (expected room or category)"),
    }
}

#[instrument(skip(session, renderer, args))]
fn cmd_add(session: &mut Session, renderer: &Renderer, args: &CommandArgs) -> anyhow::Result<()> {
    info!("command add");

    let [owner, date, start, end] = args.positionals.as_slice() else {
        bail!(
            "usage: hubcal add <device-or-group> <date> <HH:MM> <HH:MM> \
             [--daily] [--title <text>]"
        );
    };
    if session.home.schedule_of(owner).is_none() {
        bail!("no device or group named {owner}");
    }

    let date = session.date_arg(date)?;
    let start_time = parse_clock(start)?;
    let start = session
        .calendar
        .at(date, start_time)
        .ok_or_else(|| anyhow!("{start} does not exist on {date}"))?;

    let draft = ScheduleDraft {
        title: args.value("title").unwrap_or("Schedule").to_string(),
        owner_name: owner.clone(),
        start,
        end_time: parse_clock(end)?,
        repeats_daily: args.has("daily"),
    };
    let event = draft.into_event(&session.calendar)?;

    session.home.add_schedule(owner, event.clone())?;
    debug!(owner = %owner, id = %event.id, "schedule added for this run only");

    println!("Created schedule {}.", event.id);
    renderer.print_schedules(std::slice::from_ref(&event), &session.calendar)
}

fn cmd_show(style: &Style) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(style).context("failed to serialize style")?;
    print!("{rendered}");
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "Commands: month [--shift N], week, day [--follow N], expand <id> [date], \
         select <date>..., page --target <offset>, schedules [--device <name>], \
         devices [--by room|category], add <owner> <date> <HH:MM> <HH:MM>, \
         show, commands, help, version"
    );
    Ok(())
}

fn parse_clock(raw: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .with_context(|| format!("expected HH:MM, got {raw}"))
}
