//! Schedule model shared by the OSM codec and the comparator.
//!
//! A [`ScheduleDocument`] holds place [`Metadata`] and a fixed set of
//! [`Periods`]: three weekly periods (term time, summer break, minor breaks)
//! mapping each weekday to a [`DaySchedule`], and two holiday periods mapping
//! date keys to [`SpecialDateOverride`]s.
//!
//! The serde shape of these types is the JSON contract toward persistence
//! and reporting: flat `{source_found, open, slots}` records per day, and a
//! date-keyed `overrides` map per holiday period.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ScheduleError;

pub const DEFAULT_TIMEZONE: &str = "Europe/Paris";

/// Three-letter month names used in OSM dates (`2025 Dec 25`), January first.
pub const OSM_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Condition token for public holidays.
pub const PUBLIC_HOLIDAY_TOKEN: &str = "PH";

// ── Weekdays ──

/// The seven canonical weekdays, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Position in the Mo..Su order.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Two-letter OSM code (`Mo`, `Tu`, ...).
    pub fn osm_code(self) -> &'static str {
        match self {
            Self::Monday => "Mo",
            Self::Tuesday => "Tu",
            Self::Wednesday => "We",
            Self::Thursday => "Th",
            Self::Friday => "Fr",
            Self::Saturday => "Sa",
            Self::Sunday => "Su",
        }
    }

    pub fn from_osm_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|day| day.osm_code().eq_ignore_ascii_case(code.trim()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Time slots ──

/// A wall-clock time `HH:MM`. `24:00` is accepted as an end-of-day marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };
    pub const END_OF_DAY: Self = Self { hour: 24, minute: 0 };

    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        let valid = minute < 60 && (hour < 24 || (hour == 24 && minute == 0));
        valid.then_some(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = ScheduleError;

    /// Accepts `H:MM` and `HH:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let digits = h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit());
        if !digits || !(1..=2).contains(&h.len()) || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Nth-weekday-of-month qualifier: `[1,3]` means first and third.
///
/// Ordinals are kept sorted and deduplicated. Values outside 1–5 can still
/// be constructed (the JSON boundary accepts any integer); see
/// [`is_valid`](Self::is_valid).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "OccurrenceRepr", into = "OccurrenceRepr")]
pub struct Occurrence(Vec<u8>);

impl Occurrence {
    pub fn new(ordinals: impl IntoIterator<Item = u8>) -> Self {
        let mut ordinals: Vec<u8> = ordinals.into_iter().collect();
        ordinals.sort_unstable();
        ordinals.dedup();
        Self(ordinals)
    }

    pub fn ordinals(&self) -> &[u8] {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|n| (1..=5).contains(n))
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|n| n.to_string()).collect();
        write!(f, "[{}]", joined.join(","))
    }
}

/// JSON accepts either a bare integer or a list.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OccurrenceRepr {
    One(u8),
    Many(Vec<u8>),
}

impl From<OccurrenceRepr> for Occurrence {
    fn from(repr: OccurrenceRepr) -> Self {
        match repr {
            OccurrenceRepr::One(n) => Occurrence::new([n]),
            OccurrenceRepr::Many(ns) => Occurrence::new(ns),
        }
    }
}

impl From<Occurrence> for OccurrenceRepr {
    fn from(occurrence: Occurrence) -> Self {
        match occurrence.0.as_slice() {
            [n] => OccurrenceRepr::One(*n),
            _ => OccurrenceRepr::Many(occurrence.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: ClockTime,
    pub end: ClockTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<Occurrence>,
}

impl TimeSlot {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self {
            start,
            end,
            occurrence: None,
        }
    }

    pub fn with_occurrence(mut self, occurrence: Option<Occurrence>) -> Self {
        self.occurrence = occurrence;
        self
    }

    /// `HH:MM-HH:MM`, without the occurrence.
    pub fn range(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

impl FromStr for TimeSlot {
    type Err = ScheduleError;

    /// Parses `HH:MM-HH:MM` (whitespace around the dash tolerated).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| ScheduleError::InvalidSlot(s.to_string()))?;
        Ok(Self::new(start.parse()?, end.parse()?))
    }
}

// ── Days and weeks ──

/// What the source says about one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "DayRecord", into = "DayRecord")]
pub enum DaySchedule {
    /// The source said nothing about this day.
    #[default]
    NoSource,
    Closed,
    /// Open; `slots` may be empty when the source gives no hours.
    Open { slots: Vec<TimeSlot> },
}

impl DaySchedule {
    pub fn open(slots: Vec<TimeSlot>) -> Self {
        Self::Open { slots }
    }

    pub fn source_found(&self) -> bool {
        !matches!(self, Self::NoSource)
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn slots(&self) -> &[TimeSlot] {
        match self {
            Self::Open { slots } => slots,
            _ => &[],
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize)]
struct DayRecord {
    #[serde(default = "default_true")]
    source_found: bool,
    #[serde(default)]
    open: bool,
    #[serde(default)]
    slots: Vec<TimeSlot>,
}

impl From<DayRecord> for DaySchedule {
    fn from(record: DayRecord) -> Self {
        if !record.source_found {
            DaySchedule::NoSource
        } else if record.open || !record.slots.is_empty() {
            DaySchedule::Open {
                slots: record.slots,
            }
        } else {
            DaySchedule::Closed
        }
    }
}

impl From<DaySchedule> for DayRecord {
    fn from(day: DaySchedule) -> Self {
        let source_found = day.source_found();
        match day {
            DaySchedule::Open { slots } => DayRecord {
                source_found,
                open: true,
                slots,
            },
            _ => DayRecord {
                source_found,
                open: false,
                slots: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklySchedule {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl WeeklySchedule {
    /// Every weekday set to the same schedule.
    pub fn uniform(day: DaySchedule) -> Self {
        Self {
            monday: day.clone(),
            tuesday: day.clone(),
            wednesday: day.clone(),
            thursday: day.clone(),
            friday: day.clone(),
            saturday: day.clone(),
            sunday: day,
        }
    }

    pub fn day(&self, day: Weekday) -> &DaySchedule {
        match day {
            Weekday::Monday => &self.monday,
            Weekday::Tuesday => &self.tuesday,
            Weekday::Wednesday => &self.wednesday,
            Weekday::Thursday => &self.thursday,
            Weekday::Friday => &self.friday,
            Weekday::Saturday => &self.saturday,
            Weekday::Sunday => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, day: Weekday) -> &mut DaySchedule {
        match day {
            Weekday::Monday => &mut self.monday,
            Weekday::Tuesday => &mut self.tuesday,
            Weekday::Wednesday => &mut self.wednesday,
            Weekday::Thursday => &mut self.thursday,
            Weekday::Friday => &mut self.friday,
            Weekday::Saturday => &mut self.saturday,
            Weekday::Sunday => &mut self.sunday,
        }
    }

    /// Days in Mo..Su order.
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &DaySchedule)> + '_ {
        Weekday::ALL.into_iter().map(move |day| (day, self.day(day)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeeklyPeriod {
    #[serde(default)]
    pub source_found: bool,
    #[serde(default)]
    pub days: WeeklySchedule,
}

impl WeeklyPeriod {
    /// Sourced at period level and at least one day carries data.
    pub fn has_data(&self) -> bool {
        self.source_found && self.days.iter().any(|(_, day)| day.source_found())
    }

    pub fn has_open_day(&self) -> bool {
        self.days.iter().any(|(_, day)| day.is_open())
    }

    /// Carries data, and none of it is an opening.
    pub fn is_closed(&self) -> bool {
        self.has_data() && !self.has_open_day()
    }
}

// ── Holidays and special days ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideStatus {
    Closed,
    /// Open, hours unknown.
    Open,
    Slots(Vec<TimeSlot>),
}

impl OverrideStatus {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn slots(&self) -> &[TimeSlot] {
        match self {
            Self::Slots(slots) => slots,
            _ => &[],
        }
    }
}

/// A date-keyed exception to the weekly schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OverrideInput", into = "OverrideRecord")]
pub struct SpecialDateOverride {
    pub source_found: bool,
    pub status: OverrideStatus,
    pub description: Option<String>,
}

impl SpecialDateOverride {
    pub fn new(status: OverrideStatus) -> Self {
        Self {
            source_found: true,
            status,
            description: None,
        }
    }

    pub fn closed() -> Self {
        Self::new(OverrideStatus::Closed)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Holiday calendars hand over bare strings: `"closed"`, `"ferme"`,
    /// `"open"`, or a slot list such as `"09:00-12:00,14:00-17:00"`.
    /// Anything else is kept as the description of an open day.
    fn from_shorthand(raw: &str) -> Self {
        let trimmed = raw.trim();
        let status = match trimmed.to_lowercase().as_str() {
            "closed" | "off" | "ferme" | "fermé" => OverrideStatus::Closed,
            "open" | "ouvert" => OverrideStatus::Open,
            _ => {
                let slots: Vec<TimeSlot> = trimmed
                    .split(',')
                    .filter_map(|part| part.trim().parse().ok())
                    .collect();
                if slots.is_empty() {
                    return Self::new(OverrideStatus::Open).with_description(trimmed);
                }
                OverrideStatus::Slots(slots)
            }
        };
        Self::new(status)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OverrideInput {
    Shorthand(String),
    Detailed(OverrideRecord),
}

#[derive(Serialize, Deserialize)]
struct OverrideRecord {
    #[serde(default = "default_true")]
    source_found: bool,
    #[serde(default)]
    open: bool,
    #[serde(default)]
    slots: Vec<TimeSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl From<OverrideInput> for SpecialDateOverride {
    fn from(input: OverrideInput) -> Self {
        match input {
            OverrideInput::Shorthand(raw) => Self::from_shorthand(&raw),
            OverrideInput::Detailed(record) => {
                let status = if !record.slots.is_empty() {
                    OverrideStatus::Slots(record.slots)
                } else if record.open {
                    OverrideStatus::Open
                } else {
                    OverrideStatus::Closed
                };
                Self {
                    source_found: record.source_found,
                    status,
                    description: record.description,
                }
            }
        }
    }
}

impl From<SpecialDateOverride> for OverrideRecord {
    fn from(entry: SpecialDateOverride) -> Self {
        let open = entry.status.is_open();
        let slots = match entry.status {
            OverrideStatus::Slots(slots) => slots,
            _ => Vec::new(),
        };
        OverrideRecord {
            source_found: entry.source_found,
            open,
            slots,
            description: entry.description,
        }
    }
}

/// Public holidays or special days.
///
/// `mode` is the blanket rule for every holiday (`PH off`); it only renders
/// when no dated override is present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecialPeriod {
    #[serde(default)]
    pub source_found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<OverrideStatus>,
    #[serde(default)]
    pub overrides: BTreeMap<String, SpecialDateOverride>,
}

impl SpecialPeriod {
    /// Insert a dated override and mark the period as sourced.
    ///
    /// This is how collaborators merge an external holiday calendar.
    pub fn insert(&mut self, date: impl Into<String>, entry: SpecialDateOverride) {
        self.source_found = true;
        self.overrides.insert(date.into(), entry);
    }

    /// Overrides that count: both the period and the entry are sourced.
    pub fn sourced_overrides(&self) -> impl Iterator<Item = (&String, &SpecialDateOverride)> {
        self.overrides
            .iter()
            .filter(move |(_, entry)| self.source_found && entry.source_found)
    }

    pub fn sourced_mode(&self) -> Option<&OverrideStatus> {
        self.mode.as_ref().filter(|_| self.source_found)
    }

    pub fn implies_opening(&self) -> bool {
        self.sourced_mode().is_some_and(OverrideStatus::is_open)
            || self.sourced_overrides().any(|(_, entry)| entry.status.is_open())
    }
}

// ── Periods ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeeklyPeriodKind {
    Default,
    SummerBreak,
    MinorBreaks,
}

impl WeeklyPeriodKind {
    pub const ALL: [WeeklyPeriodKind; 3] = [
        WeeklyPeriodKind::Default,
        WeeklyPeriodKind::SummerBreak,
        WeeklyPeriodKind::MinorBreaks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::SummerBreak => "summer_break",
            Self::MinorBreaks => "minor_breaks",
        }
    }

    /// Quoted condition tag appended to every OSM rule of this period.
    pub fn condition_tag(self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::SummerBreak => Some("SH summer"),
            Self::MinorBreaks => Some("SH"),
        }
    }

    pub fn from_condition_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            t if t.eq_ignore_ascii_case("SH summer") => Some(Self::SummerBreak),
            t if t.eq_ignore_ascii_case("SH") => Some(Self::MinorBreaks),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialPeriodKind {
    PublicHolidays,
    SpecialDays,
}

impl SpecialPeriodKind {
    pub const ALL: [SpecialPeriodKind; 2] =
        [SpecialPeriodKind::PublicHolidays, SpecialPeriodKind::SpecialDays];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PublicHolidays => "public_holidays",
            Self::SpecialDays => "special_days",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Periods {
    pub default: WeeklyPeriod,
    pub summer_break: WeeklyPeriod,
    pub minor_breaks: WeeklyPeriod,
    pub public_holidays: SpecialPeriod,
    pub special_days: SpecialPeriod,
}

impl Periods {
    pub fn weekly(&self, kind: WeeklyPeriodKind) -> &WeeklyPeriod {
        match kind {
            WeeklyPeriodKind::Default => &self.default,
            WeeklyPeriodKind::SummerBreak => &self.summer_break,
            WeeklyPeriodKind::MinorBreaks => &self.minor_breaks,
        }
    }

    pub fn weekly_mut(&mut self, kind: WeeklyPeriodKind) -> &mut WeeklyPeriod {
        match kind {
            WeeklyPeriodKind::Default => &mut self.default,
            WeeklyPeriodKind::SummerBreak => &mut self.summer_break,
            WeeklyPeriodKind::MinorBreaks => &mut self.minor_breaks,
        }
    }

    pub fn special(&self, kind: SpecialPeriodKind) -> &SpecialPeriod {
        match kind {
            SpecialPeriodKind::PublicHolidays => &self.public_holidays,
            SpecialPeriodKind::SpecialDays => &self.special_days,
        }
    }
}

// ── Document ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub place_id: String,
    pub name: String,
    pub category: String,
    pub source_url: String,
    pub timezone: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            place_id: String::new(),
            name: String::new(),
            category: String::new(),
            source_url: String::new(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

/// A dated break range such as `2025 Jul 05-2025 Sep 01 Mo-Fr 10:00-17:00`.
///
/// Dates are ISO `YYYY-MM-DD`; `selector` is whatever followed the range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakSpan {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub selector: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleDocument {
    pub metadata: Metadata,
    pub periods: Periods,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub break_spans: Vec<BreakSpan>,
}

impl ScheduleDocument {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    /// A place closed for good: the default period is sourced and every day
    /// is closed.
    pub fn permanently_closed(metadata: Metadata) -> Self {
        let mut doc = Self::new(metadata);
        doc.periods.default = WeeklyPeriod {
            source_found: true,
            days: WeeklySchedule::uniform(DaySchedule::Closed),
        };
        doc
    }

    /// At least one weekly period carries data, none of them opens on any
    /// day, and no sourced holiday entry implies an opening.
    pub fn is_permanently_closed(&self) -> bool {
        let mut sourced = WeeklyPeriodKind::ALL
            .into_iter()
            .map(|kind| self.periods.weekly(kind))
            .filter(|period| period.has_data())
            .peekable();
        if sourced.peek().is_none() {
            return false;
        }
        sourced.all(|period| !period.has_open_day())
            && !self.periods.public_holidays.implies_opening()
            && !self.periods.special_days.implies_opening()
    }

    pub fn from_json(json: &str) -> Result<Self, ScheduleError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ScheduleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    #[test]
    fn clock_time_accepts_short_hours() {
        assert_eq!(t("9:05").to_string(), "09:05");
        assert_eq!(t("24:00").to_string(), "24:00");
    }

    #[test]
    fn clock_time_rejects_malformed() {
        for bad in ["", "9", "09:5", "25:00", "24:30", "12:60", "ab:cd", "123:00"] {
            assert!(bad.parse::<ClockTime>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn time_slot_parses_range() {
        let slot: TimeSlot = "09:00 - 12:30".parse().unwrap();
        assert_eq!(slot.range(), "09:00-12:30");
        assert!("09:00".parse::<TimeSlot>().is_err());
    }

    #[test]
    fn occurrence_is_sorted_and_deduplicated() {
        let occ = Occurrence::new([3, 1, 3]);
        assert_eq!(occ.ordinals(), &[1, 3]);
        assert_eq!(occ.to_string(), "[1,3]");
        assert!(occ.is_valid());
        assert!(!Occurrence::new([0, 2]).is_valid());
        assert!(!Occurrence::new(Vec::<u8>::new()).is_valid());
    }

    #[test]
    fn occurrence_json_accepts_int_or_list() {
        let one: Occurrence = serde_json::from_str("2").unwrap();
        let many: Occurrence = serde_json::from_str("[3,1]").unwrap();
        assert_eq!(one.ordinals(), &[2]);
        assert_eq!(many.ordinals(), &[1, 3]);
        assert_eq!(serde_json::to_string(&one).unwrap(), "2");
        assert_eq!(serde_json::to_string(&many).unwrap(), "[1,3]");
    }

    #[test]
    fn day_record_maps_to_variants() {
        let no_source: DaySchedule =
            serde_json::from_str(r#"{"source_found": false, "open": true}"#).unwrap();
        let closed: DaySchedule = serde_json::from_str(r#"{"open": false}"#).unwrap();
        let open: DaySchedule = serde_json::from_str(
            r#"{"source_found": true, "open": true, "slots": [{"start": "08:00", "end": "12:00"}]}"#,
        )
        .unwrap();

        assert_eq!(no_source, DaySchedule::NoSource);
        assert_eq!(closed, DaySchedule::Closed);
        assert_eq!(open.slots().len(), 1);
    }

    #[test]
    fn slots_without_open_flag_still_open() {
        let day: DaySchedule =
            serde_json::from_str(r#"{"open": false, "slots": [{"start": "08:00", "end": "12:00"}]}"#)
                .unwrap();
        assert!(day.is_open());
    }

    #[test]
    fn closed_day_serializes_without_slots() {
        let json = serde_json::to_value(DaySchedule::Closed).unwrap();
        assert_eq!(json["source_found"], true);
        assert_eq!(json["open"], false);
        assert_eq!(json["slots"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn override_shorthand_strings() {
        let period: SpecialPeriod = serde_json::from_str(
            r#"{
                "source_found": true,
                "overrides": {
                    "2025-12-25": "ferme",
                    "2025-07-14": "open",
                    "2025-05-08": "10:00-12:00",
                    "2025-11-01": "Toussaint"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(period.overrides["2025-12-25"].status, OverrideStatus::Closed);
        assert_eq!(period.overrides["2025-07-14"].status, OverrideStatus::Open);
        assert_eq!(period.overrides["2025-05-08"].status.slots().len(), 1);
        let other = &period.overrides["2025-11-01"];
        assert_eq!(other.status, OverrideStatus::Open);
        assert_eq!(other.description.as_deref(), Some("Toussaint"));
    }

    #[test]
    fn override_detailed_record() {
        let entry: SpecialDateOverride = serde_json::from_str(
            r#"{"source_found": true, "open": true, "slots": [{"start": "13:30", "end": "16:45"}], "description": "reduced hours"}"#,
        )
        .unwrap();
        assert_eq!(entry.status.slots()[0].range(), "13:30-16:45");
        assert_eq!(entry.description.as_deref(), Some("reduced hours"));
    }

    #[test]
    fn unsourced_period_hides_overrides() {
        let mut period = SpecialPeriod::default();
        period.overrides.insert("2025-01-01".into(), SpecialDateOverride::closed());
        assert_eq!(period.sourced_overrides().count(), 0);

        period.insert("2025-05-01", SpecialDateOverride::closed());
        assert_eq!(period.sourced_overrides().count(), 2);
    }

    #[test]
    fn permanently_closed_document() {
        let doc = ScheduleDocument::permanently_closed(Metadata::default());
        assert!(doc.is_permanently_closed());
    }

    #[test]
    fn open_holiday_breaks_permanent_closure() {
        let mut doc = ScheduleDocument::permanently_closed(Metadata::default());
        doc.periods
            .special_days
            .insert("2025-06-21", SpecialDateOverride::new(OverrideStatus::Open));
        assert!(!doc.is_permanently_closed());
    }

    #[test]
    fn closed_holiday_keeps_permanent_closure() {
        let mut doc = ScheduleDocument::permanently_closed(Metadata::default());
        doc.periods
            .public_holidays
            .insert("2025-12-25", SpecialDateOverride::closed());
        assert!(doc.is_permanently_closed());
    }

    #[test]
    fn empty_document_is_not_permanently_closed() {
        assert!(!ScheduleDocument::default().is_permanently_closed());

        // Sourced flag without any sourced day is incomplete, not closed.
        let mut doc = ScheduleDocument::default();
        doc.periods.default.source_found = true;
        assert!(!doc.is_permanently_closed());
    }

    #[test]
    fn document_json_roundtrip() {
        let mut doc = ScheduleDocument::new(Metadata {
            place_id: "S1433".into(),
            name: "Mairie du 1er".into(),
            ..Metadata::default()
        });
        doc.periods.default.source_found = true;
        doc.periods.default.days.monday = DaySchedule::open(vec![
            TimeSlot::new(t("08:45"), t("16:45")).with_occurrence(Some(Occurrence::new([1, 3]))),
        ]);
        doc.periods.public_holidays.insert("2025-12-25", SpecialDateOverride::closed());

        let json = doc.to_json_pretty().unwrap();
        let parsed = ScheduleDocument::from_json(&json).unwrap();
        assert_eq!(parsed, doc);
        assert_eq!(parsed.metadata.timezone, DEFAULT_TIMEZONE);
    }

    #[test]
    fn missing_fields_default_to_no_source() {
        let doc = ScheduleDocument::from_json(r#"{"periods": {"default": {"source_found": true}}}"#)
            .unwrap();
        assert!(doc.periods.default.source_found);
        assert_eq!(doc.periods.default.days.friday, DaySchedule::NoSource);
        assert!(!doc.periods.default.has_data());
    }

    #[test]
    fn weekday_codes() {
        assert_eq!(Weekday::from_osm_code("sa"), Some(Weekday::Saturday));
        assert_eq!(Weekday::from_osm_code("Xx"), None);
        assert_eq!(Weekday::from_index(6), Some(Weekday::Sunday));
        assert_eq!(Weekday::Thursday.osm_code(), "Th");
    }
}
