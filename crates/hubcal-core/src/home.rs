use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::datetime::Calendar;
use crate::error::CalendarError;
use crate::event::{Event, EventColor, EventId, EventTitle, Recurrence};

const USAGE_MONTHS: [&str; 12] = [
    "Jan 2024", "Feb 2024", "Mar 2024", "Apr 2024", "May 2024", "Jun 2024", "Jul 2024", "Aug 2024",
    "Sep 2024", "Oct 2024", "Nov 2024", "Dec 2024",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    Lighting,
    ClimateControl,
    Security,
    Entertainment,
    EnergyManagement,
    Appliances,
    WaterManagement,
    HomeAutomation,
    HealthAndWellness,
    CleaningAndMaintenance,
}

impl DeviceCategory {
    pub const ALL: [DeviceCategory; 10] = [
        DeviceCategory::Lighting,
        DeviceCategory::ClimateControl,
        DeviceCategory::Security,
        DeviceCategory::Entertainment,
        DeviceCategory::EnergyManagement,
        DeviceCategory::Appliances,
        DeviceCategory::WaterManagement,
        DeviceCategory::HomeAutomation,
        DeviceCategory::HealthAndWellness,
        DeviceCategory::CleaningAndMaintenance,
    ];

    pub fn key(self) -> &'static str {
        match self {
            DeviceCategory::Lighting => "lighting",
            DeviceCategory::ClimateControl => "climateControl",
            DeviceCategory::Security => "security",
            DeviceCategory::Entertainment => "entertainment",
            DeviceCategory::EnergyManagement => "energyManagement",
            DeviceCategory::Appliances => "appliances",
            DeviceCategory::WaterManagement => "waterManagement",
            DeviceCategory::HomeAutomation => "homeAutomation",
            DeviceCategory::HealthAndWellness => "healthAndWellness",
            DeviceCategory::CleaningAndMaintenance => "cleaningAndMaintenance",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DeviceCategory::Lighting => "Lighting",
            DeviceCategory::ClimateControl => "Climate Control",
            DeviceCategory::Security => "Security",
            DeviceCategory::Entertainment => "Entertainment",
            DeviceCategory::EnergyManagement => "Energy Management",
            DeviceCategory::Appliances => "Appliances",
            DeviceCategory::WaterManagement => "Water Management",
            DeviceCategory::HomeAutomation => "Home Automation",
            DeviceCategory::HealthAndWellness => "Health & Wellness",
            DeviceCategory::CleaningAndMaintenance => "Cleaning & Maintenance",
        }
    }
}

/// Categories sort by key, so listings are alphabetical rather than in
/// declaration order.
impl Ord for DeviceCategory {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}

impl PartialOrd for DeviceCategory {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElectricityUsage {
    pub month: String,
    pub watts: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub date_connected: NaiveDate,
    pub model_id: String,
    pub category: DeviceCategory,
    pub room: String,

    #[serde(default)]
    pub electricity_usage: Vec<ElectricityUsage>,

    #[serde(default)]
    pub schedule: Vec<Event>,
}

impl Device {
    pub fn average_usage(&self) -> Option<f64> {
        if self.electricity_usage.is_empty() {
            return None;
        }
        let total: f64 = self.electricity_usage.iter().map(|usage| usage.watts).sum();
        Some(total / self.electricity_usage.len() as f64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceGroup {
    pub id: String,
    pub name: String,
    pub device_ids: Vec<String>,

    #[serde(default)]
    pub schedule: Vec<Event>,

    pub room: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Home {
    #[serde(default)]
    pub devices: Vec<Device>,

    #[serde(default)]
    pub groups: Vec<DeviceGroup>,
}

impl Home {
    /// Every schedule in the home: devices first, then groups.
    pub fn all_events(&self) -> Vec<Event> {
        self.devices
            .iter()
            .flat_map(|device| device.schedule.iter())
            .chain(self.groups.iter().flat_map(|group| group.schedule.iter()))
            .cloned()
            .collect()
    }

    pub fn device_with_id(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|device| device.id == id)
    }

    pub fn device_with_name(&self, name: &str) -> Option<&Device> {
        self.devices
            .iter()
            .find(|device| device.name.eq_ignore_ascii_case(name))
    }

    pub fn group_devices(&self, group: &DeviceGroup) -> Vec<&Device> {
        group
            .device_ids
            .iter()
            .filter_map(|id| self.device_with_id(id))
            .collect()
    }

    pub fn devices_by_room(&self) -> BTreeMap<&str, Vec<&Device>> {
        let mut rooms: BTreeMap<&str, Vec<&Device>> = BTreeMap::new();
        for device in &self.devices {
            rooms.entry(device.room.as_str()).or_default().push(device);
        }
        rooms
    }

    pub fn devices_by_category(&self) -> BTreeMap<DeviceCategory, Vec<&Device>> {
        let mut categories: BTreeMap<DeviceCategory, Vec<&Device>> = BTreeMap::new();
        for device in &self.devices {
            categories.entry(device.category).or_default().push(device);
        }
        categories
    }

    /// Schedules owned by the device or group called `owner`.
    pub fn schedule_of(&self, owner: &str) -> Option<&[Event]> {
        self.devices
            .iter()
            .find(|device| device.name.eq_ignore_ascii_case(owner))
            .map(|device| device.schedule.as_slice())
            .or_else(|| {
                self.groups
                    .iter()
                    .find(|group| group.name.eq_ignore_ascii_case(owner))
                    .map(|group| group.schedule.as_slice())
            })
    }

    fn schedule_of_mut(&mut self, owner: &str) -> Option<&mut Vec<Event>> {
        if let Some(device) = self
            .devices
            .iter_mut()
            .find(|device| device.name.eq_ignore_ascii_case(owner))
        {
            return Some(&mut device.schedule);
        }
        self.groups
            .iter_mut()
            .find(|group| group.name.eq_ignore_ascii_case(owner))
            .map(|group| &mut group.schedule)
    }

    #[tracing::instrument(skip(self, event), fields(id = %event.id))]
    pub fn add_schedule(&mut self, owner: &str, event: Event) -> Result<(), CalendarError> {
        event.validate()?;
        let schedule = self
            .schedule_of_mut(owner)
            .ok_or_else(|| CalendarError::lookup_miss(format!("device or group {owner}")))?;
        schedule.push(event);
        debug!(owner, schedules = schedule.len(), "added schedule");
        Ok(())
    }

    /// Replaces the schedule with the same id, keeping its position.
    #[tracing::instrument(skip(self, event), fields(id = %event.id))]
    pub fn replace_schedule(&mut self, owner: &str, event: Event) -> Result<(), CalendarError> {
        event.validate()?;
        let schedule = self
            .schedule_of_mut(owner)
            .ok_or_else(|| CalendarError::lookup_miss(format!("device or group {owner}")))?;
        let slot = schedule
            .iter_mut()
            .find(|existing| existing.id == event.id)
            .ok_or_else(|| CalendarError::lookup_miss(format!("schedule {}", event.id)))?;
        *slot = event;
        Ok(())
    }

    /// Devices and groups of the demo home, with daily schedules anchored on
    /// `today`.
    #[tracing::instrument(skip(calendar))]
    pub fn mock(today: NaiveDate, calendar: &Calendar) -> Self {
        let devices = MOCK_DEVICES
            .iter()
            .map(|spec| Device {
                id: spec.id.to_string(),
                name: spec.name.to_string(),
                brand: spec.brand.to_string(),
                date_connected: NaiveDate::parse_from_str(spec.connected, "%Y-%m-%d")
                    .unwrap_or(today),
                model_id: spec.model_id.to_string(),
                category: spec.category,
                room: spec.room.to_string(),
                electricity_usage: USAGE_MONTHS
                    .iter()
                    .zip(spec.usage)
                    .map(|(month, watts)| ElectricityUsage {
                        month: month.to_string(),
                        watts: *watts,
                    })
                    .collect(),
                schedule: mock_schedule(spec.id, spec.name, spec.schedule, today, calendar),
            })
            .collect::<Vec<_>>();

        let groups = MOCK_GROUPS
            .iter()
            .map(|spec| DeviceGroup {
                id: spec.id.to_string(),
                name: spec.name.to_string(),
                device_ids: spec.device_ids.iter().map(|id| id.to_string()).collect(),
                schedule: mock_schedule(spec.id, spec.name, spec.schedule, today, calendar),
                room: spec.room.to_string(),
            })
            .collect::<Vec<_>>();

        debug!(
            devices = devices.len(),
            groups = groups.len(),
            "built demo home"
        );
        Self { devices, groups }
    }
}

/// A schedule being edited: the start instant, and the end picker's time of
/// day. The end always lands on the start's date.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDraft {
    pub title: String,
    pub owner_name: String,
    pub start: DateTime<Utc>,
    pub end_time: NaiveTime,
    pub repeats_daily: bool,
}

impl ScheduleDraft {
    pub fn into_event(self, calendar: &Calendar) -> Result<Event, CalendarError> {
        let id = Uuid::new_v4().to_string();
        let date = calendar.date_of(self.start);
        let end = calendar
            .at(date, self.end_time)
            .ok_or_else(|| CalendarError::InvalidTimeShift {
                id: EventId::new(id.clone()),
                date,
            })?;

        let event = Event {
            title: EventTitle::new(self.title),
            device_name: self.owner_name,
            recurrence: if self.repeats_daily {
                Recurrence::EveryDay
            } else {
                Recurrence::None
            },
            color: if self.repeats_daily {
                EventColor::cyan()
            } else {
                EventColor::blue()
            },
            ..Event::new(id, "", self.start, end)
        };
        event.validate().inspect_err(|err| {
            warn!(error = %err, "end time must be later than start time");
        })?;
        Ok(event)
    }
}

/// "h:mm AM to h:mm PM", followed by the short weekday for one-off schedules.
pub fn schedule_time_label(event: &Event, calendar: &Calendar) -> String {
    let start = calendar.local(event.start);
    let end = calendar.local(event.end);
    let mut label = format!(
        "{} to {}",
        start.format("%-I:%M %p"),
        end.format("%-I:%M %p")
    );
    if !event.is_recurring() {
        label.push_str(&start.format(" %a").to_string());
    }
    label
}

struct ScheduleSpec {
    title: &'static str,
    repeats_daily: bool,
    start: (u32, u32),
    end: (u32, u32),
}

struct DeviceSpec {
    id: &'static str,
    name: &'static str,
    brand: &'static str,
    connected: &'static str,
    model_id: &'static str,
    category: DeviceCategory,
    room: &'static str,
    usage: &'static [f64; 12],
    schedule: &'static [ScheduleSpec],
}

struct GroupSpec {
    id: &'static str,
    name: &'static str,
    device_ids: &'static [&'static str],
    room: &'static str,
    schedule: &'static [ScheduleSpec],
}

const fn daily(title: &'static str, start: (u32, u32), end: (u32, u32)) -> ScheduleSpec {
    ScheduleSpec {
        title,
        repeats_daily: true,
        start,
        end,
    }
}

const NIGHT_TIME: [ScheduleSpec; 1] = [daily("Night Time", (22, 0), (22, 30))];

const MOCK_DEVICES: [DeviceSpec; 11] = [
    DeviceSpec {
        id: "UiOWEfZuZfl1CYF6SX0Z",
        name: "Cleaning Robot",
        brand: "Narwal",
        connected: "2024-01-15",
        model_id: "AE301",
        category: DeviceCategory::CleaningAndMaintenance,
        room: "Living Room",
        usage: &[
            150.10, 160.15, 140.25, 155.35, 165.45, 170.55, 180.30, 190.70, 185.80, 211.80, 213.00,
            209.80,
        ],
        schedule: &[daily("Morning Routine", (22, 0), (22, 30))],
    },
    DeviceSpec {
        id: "UiOCLvZuZfl1CYF6SX0Z",
        name: "Smart Bulb",
        brand: "Philips",
        connected: "2024-01-15",
        model_id: "L001",
        category: DeviceCategory::Lighting,
        room: "Living Room",
        usage: &[
            150.10, 160.15, 140.25, 155.35, 165.45, 170.55, 180.30, 190.70, 185.80, 211.80, 213.00,
            209.80,
        ],
        schedule: &NIGHT_TIME,
    },
    DeviceSpec {
        id: "78Z4NmRvAwa895riPyve",
        name: "LED Strip",
        brand: "Govee",
        connected: "2024-03-10",
        model_id: "L002",
        category: DeviceCategory::Lighting,
        room: "Bedroom",
        usage: &[
            130.15, 135.25, 125.30, 145.40, 155.50, 160.45, 175.35, 185.25, 170.20, 111.80, 182.00,
            124.80,
        ],
        schedule: &NIGHT_TIME,
    },
    DeviceSpec {
        id: "9OWarU1Y6yz1SbRfjP2K",
        name: "Smart Thermostat",
        brand: "Nest",
        connected: "2024-01-01",
        model_id: "C001",
        category: DeviceCategory::ClimateControl,
        room: "Hallway",
        usage: &[
            400.10, 420.15, 430.25, 410.35, 405.45, 395.55, 415.30, 420.70, 405.80, 435.80, 433.00,
            405.80,
        ],
        schedule: &[daily("Daily Schedule", (6, 0), (8, 0))],
    },
    DeviceSpec {
        id: "Zymy1VZ8gOJnMcFYv1aU",
        name: "Air Purifier",
        brand: "Air Mega",
        connected: "2024-02-20",
        model_id: "C002",
        category: DeviceCategory::ClimateControl,
        room: "Living Room",
        usage: &[
            250.10, 260.15, 245.25, 235.35, 240.45, 230.55, 225.30, 240.70, 235.80, 215.80, 243.00,
            205.80,
        ],
        schedule: &[daily("Evening Run", (19, 0), (22, 0))],
    },
    DeviceSpec {
        id: "FLQOsaJrXQQefvebXUpA",
        name: "Smart Lock",
        brand: "August",
        connected: "2024-06-15",
        model_id: "S001",
        category: DeviceCategory::Security,
        room: "Front Door",
        usage: &[
            30.10, 35.15, 25.25, 20.35, 28.45, 30.55, 25.30, 35.70, 28.80, 35.80, 12.00, 1.80,
        ],
        schedule: &[daily("Auto-Lock Time Interval", (23, 0), (23, 5))],
    },
    DeviceSpec {
        id: "FfITYUPMb8Cooxk124D7",
        name: "Video Doorbell",
        brand: "Ring",
        connected: "2024-05-10",
        model_id: "S002",
        category: DeviceCategory::Security,
        room: "Front Door",
        usage: &[
            50.20, 55.35, 45.25, 50.30, 48.45, 52.55, 60.10, 58.20, 53.45, 15.80, 43.00, 20.80,
        ],
        schedule: &[],
    },
    DeviceSpec {
        id: "98CD1E0Q1bQLUay0Ix7i",
        name: "Smart Refrigerator",
        brand: "LG",
        connected: "2024-04-05",
        model_id: "A001",
        category: DeviceCategory::Appliances,
        room: "Kitchen",
        usage: &[
            300.10, 310.15, 290.25, 305.35, 315.45, 320.55, 310.30, 325.70, 305.80, 315.80, 343.00,
            285.80,
        ],
        schedule: &[
            daily("Cooling Schedule", (6, 0), (6, 30)),
            daily("Energy Saving Mode", (22, 0), (22, 30)),
        ],
    },
    DeviceSpec {
        id: "HXNnEcT219sUl9QeqIQk",
        name: "Smart Speaker",
        brand: "Amazon Echo",
        connected: "2024-08-20",
        model_id: "E001",
        category: DeviceCategory::Entertainment,
        room: "Living Room",
        usage: &[
            100.25, 105.30, 95.20, 110.15, 120.50, 125.45, 115.35, 130.25, 120.40, 115.80, 143.00,
            105.80,
        ],
        schedule: &[],
    },
    DeviceSpec {
        id: "NGpQEyWgv2mUeSdCVCGk",
        name: "Smart TV",
        brand: "Samsung",
        connected: "2024-07-15",
        model_id: "E002",
        category: DeviceCategory::Entertainment,
        room: "Bedroom",
        usage: &[
            200.35, 210.40, 190.25, 205.35, 220.45, 230.55, 215.30, 235.70, 225.80, 215.80, 243.00,
            205.80,
        ],
        schedule: &[ScheduleSpec {
            title: "Movie Night",
            repeats_daily: false,
            start: (19, 0),
            end: (22, 0),
        }],
    },
    DeviceSpec {
        id: "ZPzE9az1tqDC8cZppRSl",
        name: "Washing Machine",
        brand: "Bosch",
        connected: "2024-11-10",
        model_id: "A002",
        category: DeviceCategory::Appliances,
        room: "Laundry Room",
        usage: &[
            400.45, 410.55, 395.35, 405.25, 420.35, 430.45, 410.30, 425.70, 415.80, 415.80, 350.00,
            415.80,
        ],
        schedule: &[],
    },
];

const MOCK_GROUPS: [GroupSpec; 2] = [
    GroupSpec {
        id: "ZNAzMmALWvAngna2SRcn",
        name: "Lightings",
        device_ids: &["78Z4NmRvAwa895riPyve", "UiOCLvZuZfl1CYF6SX0Z"],
        room: "Upstairs",
        schedule: &NIGHT_TIME,
    },
    GroupSpec {
        id: "Yne6DaxhHp0452iusHhk",
        name: "Devices Downstairs",
        device_ids: &["Zymy1VZ8gOJnMcFYv1aU", "FLQOsaJrXQQefvebXUpA"],
        room: "Downstairs",
        schedule: &[daily("Downstairs Checkup", (22, 0), (22, 30))],
    },
];

/// Mock schedules get stable ids (`<owner id>-<n>`) so they can be addressed
/// from the command line.
fn mock_schedule(
    owner_id: &str,
    owner_name: &str,
    specs: &[ScheduleSpec],
    today: NaiveDate,
    calendar: &Calendar,
) -> Vec<Event> {
    specs
        .iter()
        .enumerate()
        .filter_map(|(idx, spec)| {
            let at = |(hour, minute): (u32, u32)| {
                NaiveTime::from_hms_opt(hour, minute, 0).and_then(|time| calendar.at(today, time))
            };
            let (Some(start), Some(end)) = (at(spec.start), at(spec.end)) else {
                warn!(owner = owner_name, title = spec.title, "mock schedule falls in a DST gap");
                return None;
            };

            let event = Event::new(format!("{owner_id}-{}", idx + 1), spec.title, start, end)
                .for_device(owner_name);
            Some(if spec.repeats_daily {
                event.repeating_daily()
            } else {
                event
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 5).expect("valid date")
    }

    #[test]
    fn mock_home_matches_demo_devices() {
        let home = Home::mock(today(), &Calendar::default());
        assert_eq!(home.devices.len(), 11);
        assert_eq!(home.groups.len(), 2);

        let thermostat = home.device_with_name("smart thermostat").expect("thermostat");
        assert_eq!(thermostat.brand, "Nest");
        assert_eq!(thermostat.schedule[0].id.as_str(), "9OWarU1Y6yz1SbRfjP2K-1");
        assert!(thermostat.schedule[0].is_recurring());
        assert_eq!(thermostat.schedule[0].color, EventColor::cyan());

        let tv = home.device_with_id("NGpQEyWgv2mUeSdCVCGk").expect("tv");
        assert!(!tv.schedule[0].is_recurring());
        assert_eq!(tv.schedule[0].color, EventColor::blue());

        let lightings = &home.groups[0];
        let names = home
            .group_devices(lightings)
            .iter()
            .map(|device| device.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["LED Strip", "Smart Bulb"]);
    }

    #[test]
    fn all_events_lists_devices_then_groups() {
        let home = Home::mock(today(), &Calendar::default());
        let events = home.all_events();
        assert_eq!(events.len(), 11);
        assert_eq!(events[0].device_name, "Cleaning Robot");
        assert_eq!(
            events.last().map(|event| event.device_name.as_str()),
            Some("Devices Downstairs")
        );
    }

    #[test]
    fn categories_group_alphabetically_by_key() {
        let home = Home::mock(today(), &Calendar::default());
        let keys = home
            .devices_by_category()
            .keys()
            .map(|category| category.display_name())
            .collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec![
                "Appliances",
                "Cleaning & Maintenance",
                "Climate Control",
                "Entertainment",
                "Lighting",
                "Security",
            ]
        );

        let rooms = home.devices_by_room();
        assert_eq!(rooms["Living Room"].len(), 4);
        assert_eq!(rooms.keys().next().copied(), Some("Bedroom"));
    }

    #[test]
    fn draft_end_takes_start_date() {
        let calendar = Calendar::default();
        let draft = ScheduleDraft {
            title: "Vacuum".to_string(),
            owner_name: "Cleaning Robot".to_string(),
            start: Utc.with_ymd_and_hms(2026, 3, 5, 9, 0, 0).single().expect("instant"),
            end_time: NaiveTime::from_hms_opt(10, 15, 0).expect("time"),
            repeats_daily: false,
        };
        let event = draft.into_event(&calendar).expect("valid draft");
        assert_eq!(
            event.end,
            Utc.with_ymd_and_hms(2026, 3, 5, 10, 15, 0).single().expect("instant")
        );
        assert_eq!(event.color, EventColor::blue());
        assert_eq!(event.title.timeline, "Vacuum");
        assert!(Uuid::parse_str(event.id.as_str()).is_ok());
    }

    #[test]
    fn draft_ending_before_start_is_rejected() {
        let draft = ScheduleDraft {
            title: "Backwards".to_string(),
            owner_name: "Smart Bulb".to_string(),
            start: Utc.with_ymd_and_hms(2026, 3, 5, 22, 0, 0).single().expect("instant"),
            end_time: NaiveTime::from_hms_opt(21, 0, 0).expect("time"),
            repeats_daily: true,
        };
        assert!(matches!(
            draft.into_event(&Calendar::default()),
            Err(CalendarError::MalformedEvent { .. })
        ));
    }

    #[test]
    fn edits_replace_in_place_and_add_to_owner() {
        let calendar = Calendar::default();
        let mut home = Home::mock(today(), &calendar);
        let mut edited = home.device_with_name("Smart Lock").expect("lock").schedule[0].clone();
        edited.end = edited.start + chrono::Duration::minutes(15);
        home.replace_schedule("Smart Lock", edited.clone()).expect("replace");
        assert_eq!(home.schedule_of("Smart Lock"), Some(std::slice::from_ref(&edited)));

        let extra = Event::new("extra", "Check", edited.start, edited.end);
        home.add_schedule("Lightings", extra).expect("add to group");
        assert_eq!(home.schedule_of("lightings").map(<[Event]>::len), Some(2));

        assert!(matches!(
            home.add_schedule(
                "Garage",
                Event::new("x", "X", edited.start, edited.end)
            ),
            Err(CalendarError::LookupMiss { .. })
        ));
    }

    #[test]
    fn labels_show_weekday_only_for_one_off() {
        let calendar = Calendar::default();
        let home = Home::mock(today(), &calendar);
        let lock = &home.device_with_name("Smart Lock").expect("lock").schedule[0];
        assert_eq!(schedule_time_label(lock, &calendar), "11:00 PM to 11:05 PM");
        let tv = &home.device_with_name("Smart TV").expect("tv").schedule[0];
        assert_eq!(schedule_time_label(tv, &calendar), "7:00 PM to 10:00 PM Thu");
    }
}
