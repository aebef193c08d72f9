mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bson::{RawBsonRef, doc};
use common::filter_lock;
use driverlog::{
    Component, Entry, Envelope, Field, Level, LogAndMonitorInstance, MaxDocumentLength,
    StructuredLogOpts, filter,
};
use proptest::prelude::*;

fn level() -> impl Strategy<Value = Level> {
    (0_u8..=8).prop_map(|repr| Level::from_repr(repr).unwrap())
}

/// An instance whose handler only counts calls.
fn counting_instance() -> (LogAndMonitorInstance, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&calls);
    let opts = StructuredLogOpts::from_lookup(|_| None).with_handler(move |_: &Entry<'_>| {
        sink.fetch_add(1, Ordering::SeqCst);
    });
    (LogAndMonitorInstance::with_structured_log_opts(&opts), calls)
}

proptest! {
    #[test]
    fn level_names_round_trip_in_any_case(level in level(), upper in any::<bool>()) {
        let name = if upper {
            level.name().to_ascii_uppercase()
        } else {
            level.name().to_ascii_lowercase()
        };
        prop_assert_eq!(Level::from_name(&name), Some(level));
        prop_assert_eq!(name.parse::<Level>().ok(), Some(level));
    }

    #[test]
    fn level_order_matches_repr(a in level(), b in level()) {
        prop_assert_eq!(a <= b, a.as_repr() <= b.as_repr());
    }

    #[test]
    fn component_codes_are_stable(code in 0_u32..64) {
        let component = Component::from_code(code);
        prop_assert_eq!(component.code(), code);
        prop_assert_eq!(component.known_index().is_some(), code < 4);
    }

    #[test]
    fn handler_runs_once_iff_level_within_ceiling(
        component in 0_u32..4,
        level in 0_u8..9,
        max in 0_u8..9,
    ) {
        let _guard = filter_lock();
        let component = Component::from_code(component);
        let level = Level::from_repr(level).unwrap();
        filter::set_max_level(component, Level::from_repr(max).unwrap());

        let (instance, calls) = counting_instance();
        instance.log(level, component, "counted", &[Field::int32("n", 1)]);

        let expected = usize::from(level.as_repr() <= max);
        prop_assert_eq!(calls.load(Ordering::SeqCst), expected);
        filter::set_max_level_all(Level::Warning);
    }

    #[test]
    fn truncation_keeps_valid_prefix(text in "\\PC{0,40}", max in 0_usize..48) {
        let out = MaxDocumentLength::Limited(max).truncate(text.clone());
        if text.len() <= max {
            prop_assert_eq!(out, text);
        } else {
            let kept = out.strip_suffix("...").unwrap();
            prop_assert!(kept.len() <= max);
            prop_assert!(text.starts_with(kept));
            prop_assert!(max - kept.len() < 4);
        }
    }

    #[test]
    fn unlimited_never_truncates(text in "\\PC{0,200}") {
        prop_assert_eq!(MaxDocumentLength::Unlimited.truncate(text.clone()), text);
    }

    #[test]
    fn duration_fields_agree(micros in 0_i64..i64::MAX) {
        let fields = [Field::duration(micros)];
        let document = Entry::new(
            Envelope {
                level: Level::Debug,
                component: Component::COMMAND,
                message: "timed",
            },
            &fields,
        )
        .materialize();

        let millis = micros / 1000;
        let expected_ms = i32::try_from(millis).map_or(RawBsonRef::Int64(millis), RawBsonRef::Int32);
        prop_assert_eq!(document.get("durationMS").unwrap(), Some(expected_ms));
        prop_assert_eq!(document.get("durationMicros").unwrap(), Some(RawBsonRef::Int64(micros)));
    }

    #[test]
    fn document_json_is_truncated_to_limit(len in 0_usize..64, max in 1_usize..32) {
        let document = doc! { "k": "é".repeat(len) };
        let full = driverlog_core::relaxed_json(&document);
        let limited = driverlog_core::relaxed_json_limited(&document, MaxDocumentLength::Limited(max));
        if full.len() <= max {
            prop_assert_eq!(limited, full);
        } else {
            prop_assert!(limited.ends_with("..."));
            prop_assert!(full.starts_with(limited.trim_end_matches("...")));
        }
    }
}

#[test]
fn filter_changes_race_safely_with_dispatch() {
    const DISPATCHERS: usize = 4;
    const ROUNDS: usize = 500;

    let _guard = filter_lock();
    filter::set_max_level_all(Level::Warning);
    let (instance, calls) = counting_instance();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for round in 0..ROUNDS {
                let ceiling = if round % 2 == 0 { Level::Debug } else { Level::Error };
                filter::set_max_level(Component::COMMAND, ceiling);
            }
        });
        for _ in 0..DISPATCHERS {
            scope.spawn(|| {
                for _ in 0..ROUNDS {
                    // Error passes both ceilings the writer alternates between.
                    instance.log(Level::Error, Component::COMMAND, "always", &[]);
                }
            });
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), DISPATCHERS * ROUNDS);

    calls.store(0, Ordering::SeqCst);
    std::thread::scope(|scope| {
        scope.spawn(|| {
            for round in 0..ROUNDS {
                let ceiling = if round % 2 == 0 { Level::Debug } else { Level::Error };
                filter::set_max_level(Component::COMMAND, ceiling);
            }
            filter::set_max_level(Component::COMMAND, Level::Error);
        });
        for _ in 0..DISPATCHERS {
            scope.spawn(|| {
                for _ in 0..ROUNDS {
                    instance.log(Level::Debug, Component::COMMAND, "sometimes", &[]);
                }
            });
        }
    });

    assert!(calls.load(Ordering::SeqCst) <= DISPATCHERS * ROUNDS);
    assert!(!filter::should_log(Component::COMMAND, Level::Debug));
    filter::set_max_level_all(Level::Warning);
}
