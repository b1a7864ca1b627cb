//! Property tests over randomly generated OSM strings.

use openhours_core::{Weekday, compare, decode, encode};
use proptest::prelude::*;

fn day_code(index: usize) -> &'static str {
    Weekday::from_index(index).map_or("Mo", Weekday::osm_code)
}

fn occurrence() -> impl Strategy<Value = String> {
    prop::collection::vec(1u8..=5, 1..3).prop_map(|ordinals| {
        let joined: Vec<String> = ordinals.iter().map(u8::to_string).collect();
        format!("[{}]", joined.join(","))
    })
}

fn day_spec() -> impl Strategy<Value = String> {
    (0usize..7, 0usize..7, prop::option::of(occurrence())).prop_map(|(from, to, occ)| {
        let days = if from == to {
            day_code(from).to_string()
        } else {
            format!("{}-{}", day_code(from), day_code(to))
        };
        format!("{days}{}", occ.unwrap_or_default())
    })
}

fn slot() -> impl Strategy<Value = String> {
    (0u8..22, 0u8..4, 1u8..3).prop_map(|(hour, quarter, len)| {
        let minute = quarter * 15;
        format!("{hour:02}:{minute:02}-{:02}:{minute:02}", hour + len)
    })
}

fn time_spec() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("off".to_string()),
        Just("open".to_string()),
        prop::collection::vec(slot(), 1..3).prop_map(|slots| slots.join(",")),
    ]
}

fn weekly_osm() -> impl Strategy<Value = String> {
    prop::collection::vec((day_spec(), time_spec()), 1..5).prop_map(|rules| {
        rules
            .into_iter()
            .map(|(days, times)| format!("{days} {times}"))
            .collect::<Vec<_>>()
            .join("; ")
    })
}

fn holiday_osm() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("; PH off".to_string()),
        Just("; PH 10:00-12:00".to_string()),
        (1u32..29, time_spec()).prop_map(|(day, times)| format!("; 2025 Dec {day} {times}")),
    ]
}

fn schedule_osm() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("closed".to_string()),
        (weekly_osm(), holiday_osm()).prop_map(|(weekly, holidays)| weekly + &holidays),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn comparison_is_reflexive(osm in schedule_osm()) {
        let doc = decode(&osm);
        let result = compare(&doc, &doc);
        prop_assert!(result.identical, "{osm:?}: {:?}", result.differences);
    }

    #[test]
    fn comparison_verdict_is_symmetric(left in schedule_osm(), right in schedule_osm()) {
        let (a, b) = (decode(&left), decode(&right));
        prop_assert_eq!(compare(&a, &b).identical, compare(&b, &a).identical);
    }

    #[test]
    fn reencoding_is_idempotent(osm in weekly_osm()) {
        let once = encode(&decode(&osm));
        let twice = encode(&decode(&once));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn reencoded_schedule_compares_identical(osm in schedule_osm()) {
        let doc = decode(&osm);
        let reparsed = decode(&encode(&doc));
        let result = compare(&doc, &reparsed);
        prop_assert!(result.identical, "{osm:?}: {:?}", result.differences);
    }
}

#[test]
fn closed_documents_agree() {
    let closed = decode("closed");
    assert!(compare(&closed, &decode("CLOSED")).identical);
    assert!(!compare(&closed, &decode("Su 10:00-12:00")).identical);
}
