//! Property-based tests for level thresholds and namespace patterns.
//!
//! Random namespaces, levels and thresholds check that what the logger prints
//! and what it stores always agree with the filtering rules.

mod test_utils;

use percy_utils::{LogLevel, LoggerConfig, NamespaceFilter};
use proptest::prelude::*;
use test_utils::captured_with;

fn level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
    ]
}

proptest! {
    #[test]
    fn shown_iff_at_or_above_threshold(threshold in level(), call in level(), ns in "[a-z]{1,8}") {
        let c = captured_with(LoggerConfig::new().with_loglevel(threshold));
        c.logger.log(&ns, call, "message", Default::default());

        let printed = !c.stdout.contents().is_empty() || !c.stderr.contents().is_empty();
        prop_assert_eq!(printed, call >= threshold);
        prop_assert_eq!(c.logger.query(|_| true).len(), 1);
    }

    #[test]
    fn exclusion_always_wins(ns in "[a-z]{1,8}(:[a-z]{1,8}){0,2}") {
        let source = format!("{ns},*,-{ns}");
        let filter = NamespaceFilter::parse(&source)
            .expect("valid pattern")
            .expect("has tokens");
        prop_assert!(!filter.matches(&ns));
    }

    #[test]
    fn wildcard_suffix_covers_children(parent in "[a-z]{1,8}", child in "[a-z]{1,8}") {
        let filter = NamespaceFilter::parse(&format!("{parent}:*"))
            .expect("valid pattern")
            .expect("has tokens");
        prop_assert!(filter.matches(&parent));
        let full = format!("{parent}:{child}");
        prop_assert!(filter.matches(&full));
    }
}
