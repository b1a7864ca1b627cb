//! OSM `opening_hours` → [`ScheduleDocument`].
//!
//! The input is irregular by construction (LLM rewrites, third-party feeds),
//! so the decoder never fails: fragments it cannot read are logged at
//! `debug` and dropped.
//!
//! # Grammar handled
//!
//! - `closed` alone: permanently closed place.
//! - Rules separated by `;` (semicolons inside `"..."` do not split).
//! - Weekly rules: `Mo-Fr 08:00-12:00,14:00-18:00`, `Sa-Mo off`,
//!   `We[1,3] 10:00-12:00`, several day/time segments per rule, a bare time
//!   spec for all days, `24/7`.
//! - `PH off` / `PH open` / `PH 10:00-12:00`: blanket public-holiday rule.
//! - `SH ...` selector or `"SH"` tag: minor school breaks; `"SH summer"` tag:
//!   summer break.
//! - Dated rules: `2025 Dec 25 off "Noël"`, `2025 Dec 24 09:00-12:00`, and
//!   spans `2025 Jul 05-2025 Sep 01 ...` or `2025 Jul 05-Sep 01 ...` kept as
//!   [`BreakSpan`]s.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::{Captures, Regex};
use tracing::debug;

use crate::model::{
    BreakSpan, ClockTime, DaySchedule, Metadata, OSM_MONTHS, Occurrence, OverrideStatus,
    ScheduleDocument, SpecialDateOverride, TimeSlot, WeeklyPeriod, WeeklyPeriodKind, Weekday,
};

static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]*)""#).unwrap());

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})\s+([A-Za-z]{3})\s+(\d{1,2})\b").unwrap());

/// A date followed by a dash opens a break span.
static SPAN_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})\s+([A-Za-z]{3})\s+(\d{1,2})\s*-\s*").unwrap()
});

/// Span end; year and month default to the start's.
static SPAN_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:(\d{4})\s+)?([A-Za-z]{3})\s+)?(\d{1,2})\b").unwrap()
});

/// A run of two-letter day tokens (`Mo-Fr,PH`, `We[1,3]`). Unknown tokens
/// stay inside the run so they cannot leak into the time spec.
static DAY_SPEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    let day = r"[A-Za-z]{2}\b";
    let item = format!(r"{day}(?:\s*-\s*{day})?(?:\s*\[[^\]]*\])?");
    Regex::new(&format!(r"\b{item}(?:\s*,\s*{item})*")).unwrap()
});

static SLOT_DASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*-\s*").unwrap());

static OCCURRENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]").unwrap());

static HOLIDAY_SELECTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PH\b\s*(.*)$").unwrap());

static BREAK_SELECTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SH\b\s*(.*)$").unwrap());

/// Decode an OSM `opening_hours` string with default metadata.
pub fn decode(osm: &str) -> ScheduleDocument {
    decode_with_metadata(osm, Metadata::default())
}

/// Decode an OSM `opening_hours` string into a document carrying `metadata`.
pub fn decode_with_metadata(osm: &str, metadata: Metadata) -> ScheduleDocument {
    let input = osm.trim();
    if input.eq_ignore_ascii_case("closed") {
        return ScheduleDocument::permanently_closed(metadata);
    }

    let mut doc = ScheduleDocument::new(metadata);
    let rules = split_rules(input);
    debug!(place_id = %doc.metadata.place_id, rules = rules.len(), "decoding opening_hours");
    for rule in rules {
        decode_rule(rule, &mut doc);
    }
    doc
}

/// Split on `;` outside quoted segments, dropping empty rules.
fn split_rules(input: &str) -> Vec<&str> {
    let mut rules = Vec::new();
    let mut in_quote = false;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '"' => in_quote = !in_quote,
            ';' if !in_quote => {
                rules.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    rules.push(&input[start..]);
    rules
        .into_iter()
        .map(str::trim)
        .filter(|rule| !rule.is_empty())
        .collect()
}

fn decode_rule(raw: &str, doc: &mut ScheduleDocument) {
    let quotes: Vec<&str> = QUOTED_RE
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .collect();
    let stripped = QUOTED_RE.replace_all(raw, " ");
    let body = stripped.trim();

    if DATE_RE.is_match(body) {
        decode_date_rule(raw, body, &quotes, doc);
        return;
    }

    if let Some(caps) = HOLIDAY_SELECTOR_RE.captures(body) {
        let rest = caps.get(1).map_or("", |m| m.as_str());
        decode_holiday_selector(rest, doc);
        return;
    }

    let mut target = quotes
        .iter()
        .find_map(|tag| WeeklyPeriodKind::from_condition_tag(tag))
        .unwrap_or(WeeklyPeriodKind::Default);

    let body = match BREAK_SELECTOR_RE.captures(body) {
        Some(caps) => {
            if target == WeeklyPeriodKind::Default {
                target = WeeklyPeriodKind::MinorBreaks;
            }
            caps.get(1).map_or("", |m| m.as_str())
        }
        None => body,
    };

    decode_weekly_rule(body, doc.periods.weekly_mut(target));
}

// ── Weekly rules ──

enum TimeSpec {
    Closed,
    /// Empty for a bare `open`.
    Open(Vec<TimeSlot>),
}

impl TimeSpec {
    fn into_status(self) -> OverrideStatus {
        match self {
            TimeSpec::Closed => OverrideStatus::Closed,
            TimeSpec::Open(slots) if slots.is_empty() => OverrideStatus::Open,
            TimeSpec::Open(slots) => OverrideStatus::Slots(slots),
        }
    }
}

fn decode_weekly_rule(body: &str, period: &mut WeeklyPeriod) {
    let specs: Vec<regex::Match<'_>> = DAY_SPEC_RE.find_iter(body).collect();

    let Some(first) = specs.first() else {
        // No day selector: the time spec covers the whole week.
        apply_time_spec(&Weekday::ALL, None, body, period);
        return;
    };

    let leading = body[..first.start()].trim();
    if !leading.is_empty() {
        debug!(token = leading, "ignoring unrecognised day token");
    }

    for (i, spec) in specs.iter().enumerate() {
        let end = specs.get(i + 1).map_or(body.len(), |next| next.start());
        let times = body[spec.end()..end].trim().trim_end_matches(',').trim();
        let (days, occurrence) = parse_day_spec(spec.as_str());
        apply_time_spec(&days, occurrence, times, period);
    }
}

/// Apply one time spec to `days`. Slots accumulate on days that are
/// already open; `off` replaces whatever was there.
fn apply_time_spec(
    days: &[Weekday],
    occurrence: Option<Occurrence>,
    times: &str,
    period: &mut WeeklyPeriod,
) {
    let Some(spec) = parse_time_spec(times) else {
        if !times.is_empty() {
            debug!(times, "ignoring unreadable time spec");
        }
        return;
    };
    if days.is_empty() {
        return;
    }

    for &day in days {
        let schedule = period.days.day_mut(day);
        match &spec {
            TimeSpec::Closed => *schedule = DaySchedule::Closed,
            TimeSpec::Open(slots) => {
                let tagged = slots
                    .iter()
                    .cloned()
                    .map(|slot| slot.with_occurrence(occurrence.clone()));
                if let DaySchedule::Open { slots: existing } = schedule {
                    existing.extend(tagged);
                } else {
                    *schedule = DaySchedule::open(tagged.collect());
                }
            }
        }
    }
    period.source_found = true;
}

fn parse_time_spec(text: &str) -> Option<TimeSpec> {
    let text = text.trim();
    match text.to_ascii_lowercase().as_str() {
        "" => None,
        "off" | "closed" => Some(TimeSpec::Closed),
        "open" => Some(TimeSpec::Open(Vec::new())),
        "24/7" => Some(TimeSpec::Open(vec![TimeSlot::new(
            ClockTime::MIDNIGHT,
            ClockTime::END_OF_DAY,
        )])),
        _ => {
            // Slots may be separated by commas or whitespace.
            let compact = SLOT_DASH_RE.replace_all(text, "-");
            let slots: Vec<TimeSlot> = compact
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .filter_map(|part| match part.parse::<TimeSlot>() {
                    Ok(slot) => Some(slot),
                    Err(err) => {
                        debug!(slot = part, %err, "dropping malformed slot");
                        None
                    }
                })
                .collect();
            (!slots.is_empty()).then_some(TimeSpec::Open(slots))
        }
    }
}

/// Expand `Mo-We,Fr[1,3]` into weekdays plus the bracketed occurrence.
///
/// Ranges wrap around the week: `Sa-Mo` is Saturday, Sunday, Monday.
fn parse_day_spec(spec: &str) -> (Vec<Weekday>, Option<Occurrence>) {
    let occurrence = OCCURRENCE_RE
        .captures(spec)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_occurrence(m.as_str()));
    let plain = OCCURRENCE_RE.replace_all(spec, "");

    let mut days = Vec::new();
    for part in plain.split(',').map(str::trim) {
        let expanded = match part.split_once('-') {
            Some((from, to)) => {
                match (Weekday::from_osm_code(from), Weekday::from_osm_code(to)) {
                    (Some(from), Some(to)) => day_range(from, to),
                    _ => {
                        debug!(token = part, "ignoring unrecognised day range");
                        continue;
                    }
                }
            }
            None => match Weekday::from_osm_code(part) {
                Some(day) => vec![day],
                None => {
                    debug!(token = part, "ignoring unrecognised day token");
                    continue;
                }
            },
        };
        for day in expanded {
            if !days.contains(&day) {
                days.push(day);
            }
        }
    }
    (days, occurrence)
}

fn day_range(from: Weekday, to: Weekday) -> Vec<Weekday> {
    let len = (to.index() + 7 - from.index()) % 7 + 1;
    (0..len)
        .filter_map(|offset| Weekday::from_index((from.index() + offset) % 7))
        .collect()
}

/// `1,3` → `[1,3]`. Ordinals outside 1–5 are dropped.
fn parse_occurrence(text: &str) -> Option<Occurrence> {
    let ordinals: Vec<u8> = text
        .split(',')
        .filter_map(|part| part.trim().parse::<u8>().ok())
        .filter(|n| (1..=5).contains(n))
        .collect();
    (!ordinals.is_empty()).then(|| Occurrence::new(ordinals))
}

fn decode_holiday_selector(rest: &str, doc: &mut ScheduleDocument) {
    let Some(spec) = parse_time_spec(rest) else {
        debug!(rest, "ignoring PH rule without a readable status");
        return;
    };
    let holidays = &mut doc.periods.public_holidays;
    holidays.source_found = true;
    holidays.mode = Some(spec.into_status());
}

// ── Dated rules ──

fn decode_date_rule(raw: &str, body: &str, quotes: &[&str], doc: &mut ScheduleDocument) {
    if let Some(start) = SPAN_START_RE.captures(body) {
        decode_break_span(raw, body, &start, doc);
        return;
    }

    let Some(caps) = DATE_RE.captures(body) else {
        return;
    };
    let Some(date) = calendar_date(&caps[1], &caps[2], &caps[3]) else {
        debug!(rule = raw, "dropping rule with an invalid date");
        return;
    };

    let rest = caps.get(0).map_or("", |m| body[m.end()..].trim());
    let status = match parse_time_spec(rest) {
        Some(spec) => spec.into_status(),
        None if raw.to_ascii_lowercase().contains("closed") => OverrideStatus::Closed,
        None => {
            debug!(rule = raw, "dropping dated rule without a status");
            return;
        }
    };

    let mut entry = SpecialDateOverride::new(status);
    if let Some(description) = quotes.iter().find(|q| !q.is_empty()) {
        entry = entry.with_description(*description);
    }
    doc.periods.public_holidays.insert(date.to_string(), entry);
}

/// `2025 Jul 05-Sep 01 Mo-Fr 10:00-16:00`. The end may omit its year, or
/// year and month; an end earlier than the start rolls into the next year.
/// Spans with an unreadable end are dropped.
fn decode_break_span(raw: &str, body: &str, start: &Captures<'_>, doc: &mut ScheduleDocument) {
    let Some(from) = calendar_date(&start[1], &start[2], &start[3]) else {
        debug!(rule = raw, "dropping break span with an invalid start date");
        return;
    };
    let tail = start.get(0).map_or("", |m| &body[m.end()..]);
    let Some(end) = SPAN_END_RE.captures(tail) else {
        debug!(rule = raw, "dropping break span without an end date");
        return;
    };

    let explicit_year = end.get(1).is_some();
    let year = end.get(1).map_or(from.year().to_string(), |m| m.as_str().to_string());
    let month = end
        .get(2)
        .map_or(OSM_MONTHS[from.month0() as usize], |m| m.as_str());
    let Some(mut to) = calendar_date(&year, month, &end[3]) else {
        debug!(rule = raw, "dropping break span with an invalid end date");
        return;
    };
    if !explicit_year && to < from {
        match to.with_year(to.year() + 1) {
            Some(next) => to = next,
            None => {
                debug!(rule = raw, "dropping break span with an invalid end date");
                return;
            }
        }
    }

    let selector = end.get(0).map_or("", |m| tail[m.end()..].trim());
    doc.break_spans.push(BreakSpan {
        from: from.to_string(),
        to: to.to_string(),
        selector: selector.to_string(),
    });
}

/// `2025`, `Dec`, `5` → 2025-12-05; `None` for unknown months or
/// impossible dates.
fn calendar_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let month = OSM_MONTHS
        .iter()
        .position(|name| name.eq_ignore_ascii_case(month))?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month as u32 + 1, day.parse().ok()?)
}
