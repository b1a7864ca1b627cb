//! Vertical card display for comparison results and encoded periods.

use openhours_core::compare::{ComparisonResult, PeriodDifference};
use openhours_core::encode::EncodedPeriods;

// ── Public API ──

/// Print a comparison as a card: inputs, verdict, then one section per
/// source of differences.
pub fn print_comparison_card(left: &str, right: &str, result: &ComparisonResult) {
    for line in comparison_lines(left, right, result) {
        println!("{line}");
    }
}

pub fn print_periods_card(encoded: &EncodedPeriods) {
    for line in periods_lines(encoded) {
        println!("{line}");
    }
}

// ── Card rendering ──

fn comparison_lines(left: &str, right: &str, result: &ComparisonResult) -> Vec<String> {
    let verdict = if result.identical {
        "identical"
    } else {
        "different"
    };
    let details = &result.details;

    let mut lines = vec![
        "=== comparison ===".to_string(),
        row("left", left),
        row("right", right),
        row("verdict", verdict),
        row("left permanently closed", yes_no(details.left_permanently_closed)),
        row("right permanently closed", yes_no(details.right_permanently_closed)),
        String::new(),
    ];

    if result.identical {
        return lines;
    }

    // Permanent-closure mismatches carry no per-item detail.
    if details.special.is_empty() && details.weekly.is_empty() {
        section(&mut lines, "Differences", result.differences.iter().map(|d| ("", d.clone())));
        return lines;
    }

    section(
        &mut lines,
        "Holidays",
        details
            .special
            .iter()
            .map(|(key, difference)| (key.as_str(), difference.describe())),
    );
    for period in &details.weekly {
        period_section(&mut lines, period);
    }
    lines
}

fn period_section(lines: &mut Vec<String>, period: &PeriodDifference) {
    section(
        lines,
        period.period.as_str(),
        period
            .days
            .iter()
            .map(|(day, difference)| (day.as_str(), difference.describe())),
    );
}

fn periods_lines(encoded: &EncodedPeriods) -> Vec<String> {
    let mut lines = vec!["=== opening_hours ===".to_string(), encoded.to_osm(), String::new()];
    if encoded.permanently_closed {
        lines.push(row("permanently closed", "yes"));
        return lines;
    }

    let fragments = [
        ("default", &encoded.default),
        ("summer_break", &encoded.summer_break),
        ("minor_breaks", &encoded.minor_breaks),
        ("break_spans", &encoded.break_spans),
        ("public_holidays", &encoded.public_holidays),
        ("special_days", &encoded.special_days),
    ];
    section(
        &mut lines,
        "Periods",
        fragments
            .into_iter()
            .filter_map(|(name, fragment)| fragment.clone().map(|text| (name, text))),
    );
    lines
}

// ── Helpers ──

fn section<'a>(
    lines: &mut Vec<String>,
    header: &str,
    rows: impl IntoIterator<Item = (&'a str, String)>,
) {
    let rows: Vec<String> = rows
        .into_iter()
        .map(|(label, value)| row(label, &value))
        .collect();
    if rows.is_empty() {
        return;
    }
    lines.push(header.to_string());
    lines.extend(rows);
    lines.push(String::new());
}

fn row(label: &str, value: &str) -> String {
    format!("  {label:<26} {value}")
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openhours_core::{compare, decode, encode_periods};

    #[test]
    fn identical_card_has_no_sections() {
        let doc = decode("Mo-Fr 09:00-17:00");
        let lines = comparison_lines("a", "b", &compare(&doc, &doc));
        assert!(lines.iter().any(|l| l.contains("identical")));
        assert!(!lines.iter().any(|l| l == "default"));
    }

    #[test]
    fn differences_grouped_by_period() {
        let a = decode("Mo-Fr 09:00-17:00; 2025 Dec 25 off");
        let b = decode("Mo-Th 09:00-17:00; Fr off");
        let lines = comparison_lines("a", "b", &compare(&a, &b));

        let holidays = lines.iter().position(|l| l == "Holidays").unwrap();
        let default = lines.iter().position(|l| l == "default").unwrap();
        assert!(holidays < default);
        assert!(lines[holidays + 1].contains("2025-12-25"));
        assert!(lines[default + 1].contains("friday"));
        assert!(lines[default + 1].ends_with("open -> closed; removed 09:00-17:00"));
    }

    #[test]
    fn permanent_closure_listed_plainly() {
        let lines = comparison_lines(
            "closed",
            "Mo 10:00-12:00",
            &compare(&decode("closed"), &decode("Mo 10:00-12:00")),
        );
        assert!(lines.iter().any(|l| l.ends_with("left permanently closed, right open")));
    }

    #[test]
    fn periods_card_lists_fragments() {
        let encoded = encode_periods(&decode("Mo-Fr 09:00-17:00; PH off"));
        let lines = periods_lines(&encoded);
        assert_eq!(lines[1], "Mo-Fr 09:00-17:00; Sa-Su off; PH off");
        assert!(lines.iter().any(|l| l.contains("public_holidays") && l.ends_with("PH off")));
        assert!(!lines.iter().any(|l| l.contains("summer_break")));
    }
}
