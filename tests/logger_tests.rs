mod test_utils;

use percy_utils::{Color, ErrorPayload, LogLevel, LoggerConfig, Meta};
use rstest::rstest;
use serde_json::json;
use test_utils::{Captured, captured, captured_with, label};

#[rstest]
fn groups_share_one_store(captured: Captured) {
    captured.logger.group("cli").info("one");
    captured.logger.group("sdk").warn("two");

    let all: Vec<_> = captured
        .logger
        .query(|_| true)
        .iter()
        .map(|r| (r.namespace.clone(), r.level.clone(), r.message.clone()))
        .collect();
    assert_eq!(
        all,
        [
            ("cli".into(), "info".into(), "one".into()),
            ("sdk".into(), "warn".into(), "two".into()),
        ]
    );
}

#[rstest]
fn meta_is_kept_on_the_record(captured: Captured) {
    let mut meta = Meta::new();
    meta.insert("snapshot".into(), json!("home"));
    captured.logger.group("cli").info_with("taken", meta.clone());

    let records = captured.logger.query(|r| r.meta.get("snapshot").is_some());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].meta, meta);
    assert!(!records[0].is_remote());
}

#[rstest]
#[case("*,-foo:*", "foo:bar", false)]
#[case("*,-foo:*", "foo", false)]
#[case("*,-foo:*", "other", true)]
#[case("cli:*", "cli", true)]
#[case("cli:*", "sdk", false)]
#[case("cli:* sdk", "sdk", true)]
#[case("-cli:secret,cli:*", "cli:secret", false)]
fn debug_string_selects_namespaces(#[case] filter: &str, #[case] ns: &str, #[case] shown: bool) {
    let c = captured_with(LoggerConfig::new().with_debug(filter));
    assert_eq!(c.logger.should_log(ns, "info"), shown);

    c.logger.group(ns).info("hello");
    assert_eq!(!c.stdout.contents().is_empty(), shown);
}

#[rstest]
fn url_is_highlighted(captured: Captured) {
    captured
        .logger
        .group("cli")
        .info("Finalized build: https://percy.io/org/project/builds/1");
    assert_eq!(
        captured.stdout.contents(),
        format!(
            "{} Finalized build: {}\n",
            label(None),
            Color::Blue.paint("https://percy.io/org/project/builds/1")
        )
    );
}

#[derive(Debug, thiserror::Error)]
#[error("upload failed")]
struct UploadError(#[source] std::io::Error);

#[rstest]
fn error_causes_are_stored_but_not_printed(captured: Captured) {
    let err = UploadError(std::io::Error::other("disk full"));
    captured
        .logger
        .group("cli")
        .error(ErrorPayload::from_error(&err));

    assert_eq!(
        captured.stderr.contents(),
        format!("{} {}\n", label(None), Color::Red.paint("Error: upload failed"))
    );
    let stored = captured.logger.query(|_| true);
    assert_eq!(stored[0].message, "upload failed\nCaused by: disk full");
}

#[test]
fn debug_mode_labels_every_line() {
    let c = captured_with(LoggerConfig::new().with_debug("*"));
    let log = c.logger.group("sdk");
    log.debug("a");
    log.error("b");

    assert!(c.stderr.lines()[0].starts_with(&format!("{} a ", label(Some("sdk")))));
    assert!(
        c.stderr.lines()[1].starts_with(&format!("{} {} ", label(Some("sdk")), Color::Red.paint("b")))
    );
}

#[rstest]
fn loglevel_can_be_changed_at_runtime(captured: Captured) {
    let log = captured.logger.group("cli");
    captured.logger.set_loglevel(LogLevel::Error);
    log.warn("quiet");
    assert!(captured.stderr.contents().is_empty());

    captured.logger.set_loglevel(LogLevel::Debug);
    log.debug("loud");
    assert!(!captured.stderr.contents().is_empty());
    assert_eq!(log.loglevel(), LogLevel::Debug);
}
