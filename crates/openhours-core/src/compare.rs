//! Semantic comparison of two [`ScheduleDocument`]s.
//!
//! Differences come out in a fixed order: holiday and special-day entries
//! (sorted by key), then the weekly periods in enumeration order, days
//! Monday first. A single item that cannot be normalised yields one
//! `comparison error` entry; the rest of the comparison carries on.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::CompareError;
use crate::model::{
    DaySchedule, OverrideStatus, PUBLIC_HOLIDAY_TOKEN, ScheduleDocument, SpecialPeriod,
    TimeSlot, WeeklyPeriodKind, Weekday,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub identical: bool,
    pub differences: Vec<String>,
    pub details: ComparisonDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ComparisonDetails {
    pub left_permanently_closed: bool,
    pub right_permanently_closed: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub special: BTreeMap<String, ItemDifference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weekly: Vec<PeriodDifference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodDifference {
    pub period: WeeklyPeriodKind,
    pub days: BTreeMap<Weekday, ItemDifference>,
}

/// Open flag on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub left: bool,
    pub right: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemDifference {
    /// Only on the right.
    Added,
    /// Only on the left.
    Removed,
    Changed {
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<StatusChange>,
        /// Slot labels only on the right.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        added: Vec<String>,
        /// Slot labels only on the left.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        removed: Vec<String>,
    },
    Error {
        message: String,
    },
}

impl ItemDifference {
    /// One-line description: `open -> closed; added 14:00-18:00`.
    pub fn describe(&self) -> String {
        match self {
            Self::Added => "added".to_string(),
            Self::Removed => "removed".to_string(),
            Self::Changed {
                status,
                added,
                removed,
            } => {
                let mut parts = Vec::new();
                if let Some(change) = status {
                    parts.push(format!(
                        "{} -> {}",
                        open_label(change.left),
                        open_label(change.right)
                    ));
                }
                if !added.is_empty() {
                    parts.push(format!("added {}", added.join(", ")));
                }
                if !removed.is_empty() {
                    parts.push(format!("removed {}", removed.join(", ")));
                }
                parts.join("; ")
            }
            Self::Error { message } => format!("comparison error: {message}"),
        }
    }
}

fn open_label(open: bool) -> &'static str {
    if open { "open" } else { "closed" }
}

pub fn compare(left: &ScheduleDocument, right: &ScheduleDocument) -> ComparisonResult {
    let mut details = ComparisonDetails {
        left_permanently_closed: left.is_permanently_closed(),
        right_permanently_closed: right.is_permanently_closed(),
        ..ComparisonDetails::default()
    };

    match (details.left_permanently_closed, details.right_permanently_closed) {
        (true, true) => return finish(Vec::new(), details),
        (true, false) => {
            return finish(vec!["left permanently closed, right open".to_string()], details);
        }
        (false, true) => {
            return finish(vec!["left open, right permanently closed".to_string()], details);
        }
        (false, false) => {}
    }

    let mut differences = Vec::new();

    let left_special = combined_special(left);
    let right_special = combined_special(right);
    let keys: BTreeSet<&String> = left_special.keys().chain(right_special.keys()).collect();
    for key in keys {
        let difference = match (left_special.get(key), right_special.get(key)) {
            (Some(l), Some(r)) => compare_item(ItemView::from(*l), ItemView::from(*r)),
            (None, Some(_)) => Some(ItemDifference::Added),
            (Some(_), None) => Some(ItemDifference::Removed),
            (None, None) => None,
        };
        if let Some(difference) = difference {
            record(&mut differences, format!("holidays: {key}"), &difference);
            details.special.insert(key.clone(), difference);
        }
    }

    for kind in WeeklyPeriodKind::ALL {
        let (l, r) = (left.periods.weekly(kind), right.periods.weekly(kind));
        if !l.source_found && !r.source_found {
            continue;
        }
        let mut days = BTreeMap::new();
        for day in Weekday::ALL {
            let l_day = ItemView::from(l.days.day(day));
            let r_day = ItemView::from(r.days.day(day));
            if let Some(difference) = compare_item(l_day, r_day) {
                record(
                    &mut differences,
                    format!("{}: {day}", kind.as_str()),
                    &difference,
                );
                days.insert(day, difference);
            }
        }
        if !days.is_empty() {
            details.weekly.push(PeriodDifference { period: kind, days });
        }
    }

    finish(differences, details)
}

fn finish(differences: Vec<String>, details: ComparisonDetails) -> ComparisonResult {
    let identical = differences.is_empty();
    info!(identical, differences = differences.len(), "schedules compared");
    ComparisonResult {
        identical,
        differences,
        details,
    }
}

fn record(differences: &mut Vec<String>, label: String, difference: &ItemDifference) {
    if let ItemDifference::Error { message } = difference {
        warn!(item = %label, %message, "item could not be compared");
    }
    differences.push(format!("{label}: {}", difference.describe()));
}

/// Special days, then public holidays on top so they win on key collision.
/// A sourced blanket mode joins under `PH` when its period has no dated
/// entries.
fn combined_special(doc: &ScheduleDocument) -> BTreeMap<String, &OverrideStatus> {
    let public = &doc.periods.public_holidays;
    let special = &doc.periods.special_days;

    let mut combined = BTreeMap::new();
    for period in [special, public] {
        for (key, entry) in period.sourced_overrides() {
            combined.insert(key.clone(), &entry.status);
        }
    }

    let mode = [public, special]
        .into_iter()
        .filter(|period| !has_sourced_overrides(period))
        .find_map(SpecialPeriod::sourced_mode);
    if let Some(mode) = mode {
        combined
            .entry(PUBLIC_HOLIDAY_TOKEN.to_string())
            .or_insert(mode);
    }
    combined
}

fn has_sourced_overrides(period: &SpecialPeriod) -> bool {
    period.sourced_overrides().next().is_some()
}

// ── Item comparison ──

#[derive(Clone, Copy)]
struct ItemView<'a> {
    open: bool,
    slots: &'a [TimeSlot],
}

impl<'a> From<&'a DaySchedule> for ItemView<'a> {
    fn from(day: &'a DaySchedule) -> Self {
        Self {
            open: day.is_open(),
            slots: day.slots(),
        }
    }
}

impl<'a> From<&'a OverrideStatus> for ItemView<'a> {
    fn from(status: &'a OverrideStatus) -> Self {
        Self {
            open: status.is_open(),
            slots: status.slots(),
        }
    }
}

fn compare_item(left: ItemView<'_>, right: ItemView<'_>) -> Option<ItemDifference> {
    if left.open == right.open && left.slots == right.slots {
        return None;
    }

    let (l, r) = match (normalize(left.slots), normalize(right.slots)) {
        (Ok(l), Ok(r)) => (l, r),
        (Err(err), _) | (_, Err(err)) => {
            return Some(ItemDifference::Error {
                message: err.to_string(),
            });
        }
    };

    let status = (left.open != right.open).then_some(StatusChange {
        left: left.open,
        right: right.open,
    });
    let added: Vec<String> = r.iter().filter(|label| !l.contains(label)).cloned().collect();
    let removed: Vec<String> = l.iter().filter(|label| !r.contains(label)).cloned().collect();

    if status.is_none() && added.is_empty() && removed.is_empty() {
        return None;
    }
    Some(ItemDifference::Changed {
        status,
        added,
        removed,
    })
}

/// Validate occurrences, order by start then occurrence, and label each slot
/// (`10:00-12:00[1,3]`).
fn normalize(slots: &[TimeSlot]) -> Result<Vec<String>, CompareError> {
    for slot in slots {
        if let Some(occurrence) = &slot.occurrence {
            let ordinals = occurrence.ordinals();
            if ordinals.is_empty() {
                return Err(CompareError::EmptyOccurrence { slot: slot.range() });
            }
            if let Some(&ordinal) = ordinals.iter().find(|n| !(1..=5).contains(*n)) {
                return Err(CompareError::InvalidOccurrence {
                    slot: slot.range(),
                    ordinal,
                });
            }
        }
    }

    let mut sorted: Vec<&TimeSlot> = slots.iter().collect();
    sorted.sort_by(|a, b| (a.start, &a.occurrence).cmp(&(b.start, &b.occurrence)));
    let mut labels: Vec<String> = sorted.into_iter().map(slot_label).collect();
    labels.dedup();
    Ok(labels)
}

fn slot_label(slot: &TimeSlot) -> String {
    match &slot.occurrence {
        Some(occurrence) => format!("{}{occurrence}", slot.range()),
        None => slot.range(),
    }
}
