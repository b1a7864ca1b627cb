//! [`ScheduleDocument`] → OSM `opening_hours`.
//!
//! Output order is fixed: default period, summer break (`"SH summer"`),
//! minor breaks (`"SH"`), break spans, public holidays, special days.
//! Rules are joined with `"; "`.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::model::{
    BreakSpan, DaySchedule, OSM_MONTHS, Occurrence, OverrideStatus, PUBLIC_HOLIDAY_TOKEN,
    ScheduleDocument, SpecialPeriod, TimeSlot, WeeklyPeriod, WeeklyPeriodKind, Weekday,
};

/// Per-period OSM fragments. `None` means the period carries no data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EncodedPeriods {
    pub permanently_closed: bool,
    pub default: Option<String>,
    pub summer_break: Option<String>,
    pub minor_breaks: Option<String>,
    pub break_spans: Option<String>,
    pub public_holidays: Option<String>,
    pub special_days: Option<String>,
}

impl EncodedPeriods {
    pub fn to_osm(&self) -> String {
        if self.permanently_closed {
            return "off".to_string();
        }
        [
            &self.default,
            &self.summer_break,
            &self.minor_breaks,
            &self.break_spans,
            &self.public_holidays,
            &self.special_days,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ")
    }
}

pub fn encode(doc: &ScheduleDocument) -> String {
    encode_periods(doc).to_osm()
}

pub fn encode_periods(doc: &ScheduleDocument) -> EncodedPeriods {
    if doc.is_permanently_closed() {
        return EncodedPeriods {
            permanently_closed: true,
            default: Some("off".to_string()),
            ..EncodedPeriods::default()
        };
    }

    let periods = &doc.periods;
    let encoded = EncodedPeriods {
        permanently_closed: false,
        default: encode_weekly(&periods.default, WeeklyPeriodKind::Default),
        summer_break: encode_weekly(&periods.summer_break, WeeklyPeriodKind::SummerBreak),
        minor_breaks: encode_weekly(&periods.minor_breaks, WeeklyPeriodKind::MinorBreaks),
        break_spans: encode_break_spans(&doc.break_spans),
        public_holidays: encode_special(&periods.public_holidays),
        special_days: encode_special(&periods.special_days),
    };
    debug!(place_id = %doc.metadata.place_id, "encoded schedule");
    encoded
}

// ── Weekly periods ──

/// Weekdays sharing the same key render as one rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    occurrence: Option<Occurrence>,
    times: String,
}

impl GroupKey {
    fn render(&self, days: &[Weekday]) -> String {
        let occurrence = self
            .occurrence
            .as_ref()
            .map(Occurrence::to_string)
            .unwrap_or_default();
        format!("{}{} {}", compress_day_ranges(days), occurrence, self.times)
    }
}

fn encode_weekly(period: &WeeklyPeriod, kind: WeeklyPeriodKind) -> Option<String> {
    if !period.has_data() {
        return None;
    }
    let rules = weekly_rules(period);
    let rules = match kind.condition_tag() {
        Some(tag) => rules
            .into_iter()
            .map(|rule| format!("{rule} \"{tag}\""))
            .collect(),
        None => rules,
    };
    Some(rules.join("; "))
}

fn weekly_rules(period: &WeeklyPeriod) -> Vec<String> {
    if !period.has_open_day() {
        return vec!["off".to_string()];
    }

    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<(GroupKey, Vec<Weekday>)> = Vec::new();
    let mut closed = Vec::new();

    for (day, schedule) in period.days.iter() {
        let keys = day_keys(schedule);
        if keys.is_empty() {
            closed.push(day);
            continue;
        }
        for key in keys {
            let slot = *index.entry(key.clone()).or_insert_with(|| {
                groups.push((key, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(day);
        }
    }

    let mut rules: Vec<String> = groups
        .iter()
        .map(|(key, days)| key.render(days))
        .collect();
    if !closed.is_empty() {
        rules.push(format!("{} off", compress_day_ranges(&closed)));
    }
    rules
}

/// Untagged slots form one key, each valid occurrence its own. A slot with
/// an invalid occurrence is treated as untagged.
fn day_keys(schedule: &DaySchedule) -> Vec<GroupKey> {
    let DaySchedule::Open { slots } = schedule else {
        return Vec::new();
    };

    let mut untagged = Vec::new();
    let mut tagged: BTreeMap<&Occurrence, Vec<&TimeSlot>> = BTreeMap::new();
    for slot in slots {
        match &slot.occurrence {
            Some(occurrence) if occurrence.is_valid() => {
                tagged.entry(occurrence).or_default().push(slot)
            }
            _ => untagged.push(slot),
        }
    }

    let mut keys = Vec::new();
    if !untagged.is_empty() {
        keys.push(GroupKey {
            occurrence: None,
            times: join_ranges(untagged),
        });
    } else if tagged.is_empty() {
        keys.push(GroupKey {
            occurrence: None,
            times: "open".to_string(),
        });
    }
    keys.extend(tagged.into_iter().map(|(occurrence, slots)| GroupKey {
        occurrence: Some(occurrence.clone()),
        times: join_ranges(slots),
    }));
    keys
}

fn join_ranges(mut slots: Vec<&TimeSlot>) -> String {
    slots.sort_by_key(|slot| (slot.start, slot.end));
    let mut ranges: Vec<String> = slots.iter().map(|slot| slot.range()).collect();
    ranges.dedup();
    ranges.join(",")
}

/// Collapse weekdays (Mo..Su order) into ranges: runs of two or more become
/// `A-B`, the rest stay single. `[Mo, Tu, Th, Fr]` → `Mo-Tu,Th-Fr`.
pub fn compress_day_ranges(days: &[Weekday]) -> String {
    let mut sorted = days.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut parts = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let start = sorted[i];
        let mut end = start;
        while i + 1 < sorted.len() && sorted[i + 1].index() == end.index() + 1 {
            i += 1;
            end = sorted[i];
        }
        if start == end {
            parts.push(start.osm_code().to_string());
        } else {
            parts.push(format!("{}-{}", start.osm_code(), end.osm_code()));
        }
        i += 1;
    }
    parts.join(",")
}

// ── Holidays, special days, break spans ──

fn encode_special(period: &SpecialPeriod) -> Option<String> {
    let mut rules: Vec<String> = period
        .sourced_overrides()
        .map(|(key, entry)| {
            let date = osm_date(key).unwrap_or_else(|| {
                debug!(key = %key, "unparseable override date, rendering as PH");
                PUBLIC_HOLIDAY_TOKEN.to_string()
            });
            let mut rule = format!("{date} {}", status_text(&entry.status));
            if let Some(description) = entry.description.as_deref() {
                let description = description.replace('"', "");
                let description = description.trim();
                if !description.is_empty() {
                    rule.push_str(&format!(" \"{description}\""));
                }
            }
            rule
        })
        .collect();

    if rules.is_empty()
        && let Some(mode) = period.sourced_mode()
    {
        rules.push(format!("{PUBLIC_HOLIDAY_TOKEN} {}", status_text(mode)));
    }
    (!rules.is_empty()).then(|| rules.join("; "))
}

fn status_text(status: &OverrideStatus) -> String {
    match status {
        OverrideStatus::Closed => "off".to_string(),
        OverrideStatus::Slots(slots) if !slots.is_empty() => join_ranges(slots.iter().collect()),
        OverrideStatus::Open | OverrideStatus::Slots(_) => "open".to_string(),
    }
}

fn encode_break_spans(spans: &[BreakSpan]) -> Option<String> {
    let rules: Vec<String> = spans
        .iter()
        .filter_map(|span| {
            let rule = format!("{}-{}", osm_date(&span.from)?, osm_date(&span.to)?);
            let selector = span.selector.trim();
            Some(if selector.is_empty() {
                rule
            } else {
                format!("{rule} {selector}")
            })
        })
        .collect();
    (!rules.is_empty()).then(|| rules.join("; "))
}

/// `2025-12-05` → `2025 Dec 05`.
fn osm_date(iso: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d").ok()?;
    Some(format!(
        "{} {} {:02}",
        date.year(),
        OSM_MONTHS[date.month0() as usize],
        date.day()
    ))
}
