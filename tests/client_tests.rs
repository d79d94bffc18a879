//! PercyClient against a stub CLI API served from a local socket.

mod test_utils;

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use percy_utils::client::BackoffPolicy;
use percy_utils::{ClientConfig, ClientError, LoggerConfig, PercyClient};
use rstest::rstest;
use serde_json::{Value, json};
use test_utils::captured_with;

#[derive(Clone, Debug)]
struct Seen {
    method: String,
    path: String,
    body: String,
}

struct Reply {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: String,
}

impl Reply {
    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type", "application/json".into())],
            body: body.to_string(),
        }
    }

    fn text(body: &str) -> Self {
        Self {
            status: 200,
            headers: vec![("Content-Type", "application/javascript".into())],
            body: body.into(),
        }
    }

    fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

type Route = Arc<dyn Fn(&Seen) -> Reply + Send + Sync>;

/// Serve `route` on a loopback port, one request per connection.
fn stub(route: impl Fn(&Seen) -> Reply + Send + Sync + 'static) -> (String, Receiver<Seen>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = format!("http://{}", listener.local_addr().expect("addr"));
    let (tx, rx) = unbounded();
    let route: Route = Arc::new(route);
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let route = Arc::clone(&route);
            let tx = tx.clone();
            thread::spawn(move || serve(stream, &*route, &tx));
        }
    });
    (address, rx)
}

fn serve(stream: TcpStream, route: &(dyn Fn(&Seen) -> Reply + Send + Sync), tx: &Sender<Seen>) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let path = parts.next().unwrap_or_default().to_owned();

    let mut content_length = 0;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).expect("body");

    let seen = Seen {
        method,
        path,
        body: String::from_utf8(body).expect("utf8 body"),
    };
    let reply = route(&seen);
    let _ = tx.send(seen);

    let mut out = format!("HTTP/1.1 {} Stub\r\n", reply.status);
    for (name, value) in &reply.headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.body.len(),
        reply.body
    ));
    let mut stream = stream;
    let _ = stream.write_all(out.as_bytes());
}

fn client(address: &str) -> PercyClient {
    PercyClient::new(
        ClientConfig::default()
            .with_address(address)
            .with_request_timeout(Duration::from_secs(2)),
    )
}

fn unused_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    format!("http://{}", listener.local_addr().expect("addr"))
}

#[test]
fn request_parses_json_bodies() {
    let (address, seen) = stub(|_| Reply::json(200, json!({"success": true})));
    let response = client(&address).request("/percy/healthcheck").expect("ok");

    assert_eq!(response.body, json!({"success": true}));
    assert_eq!(seen.recv().expect("seen").path, "/percy/healthcheck");
}

#[rstest]
#[case(json!({"error": "Build is missing"}), "Build is missing")]
#[case(json!({}), "500 Stub")]
fn failures_carry_a_message(#[case] body: Value, #[case] expected: &str) {
    let (address, _seen) = stub(move |_| Reply::json(500, body.clone()));
    let err = client(&address).request("/percy/idle").expect_err("fails");

    assert_eq!(err.to_string(), expected);
    assert_eq!(err.response().map(|r| r.status), Some(500));
}

#[test]
fn healthcheck_enables_supported_cli() {
    let (address, _seen) = stub(|seen| match seen.path.as_str() {
        "/percy/healthcheck" => Reply::json(200, json!({"success": true, "config": {"snapshot": {"widths": [1280]}}}))
            .header("X-Percy-Core-Version", "1.2.3"),
        _ => Reply::json(404, json!({})),
    });
    let c = captured_with(LoggerConfig::new());
    let percy = client(&address);

    assert!(percy.is_enabled(&c.logger));
    assert_eq!(percy.version().to_string(), "1.2.3");
    assert_eq!(
        percy.cli_config(),
        Some(json!({"snapshot": {"widths": [1280]}}))
    );
    assert!(c.stdout.contents().is_empty());
}

#[test]
fn cli_without_log_collector_keeps_logging_local() {
    let (address, _seen) = stub(|seen| match seen.path.as_str() {
        "/percy/healthcheck" => Reply::json(200, json!({"success": true}))
            .header("X-Percy-Core-Version", "1.0.0"),
        _ => Reply::json(400, json!({})),
    });
    let c = captured_with(LoggerConfig::new());
    let percy = client(&address);

    assert!(percy.is_enabled(&c.logger));
    assert!(!c.logger.is_remote());
    c.logger.group("sdk").info("Snapshot taken");
    assert!(c.stdout.contents().ends_with("Snapshot taken\n"));
}

#[test]
fn healthcheck_result_is_cached() {
    let (address, seen) = stub(|_| Reply::json(200, json!({})).header("x-percy-core-version", "1.0.0"));
    let c = captured_with(LoggerConfig::new());
    let percy = client(&address);

    assert!(percy.is_enabled(&c.logger));
    assert!(percy.is_enabled(&c.logger));
    let healthchecks = seen
        .try_iter()
        .filter(|s| s.path == "/percy/healthcheck")
        .count();
    assert_eq!(healthchecks, 1);
}

#[test]
fn unsupported_version_disables_snapshots() {
    let (address, _seen) = stub(|_| Reply::json(200, json!({})).header("x-percy-core-version", "2.0.0"));
    let c = captured_with(LoggerConfig::new().with_debug("utils"));
    let percy = client(&address);

    assert!(!percy.is_enabled(&c.logger));
    let messages: Vec<_> = c
        .logger
        .query(|r| r.namespace == "utils")
        .iter()
        .map(|r| r.message.clone())
        .collect();
    assert_eq!(
        messages,
        [
            "Unsupported Percy CLI version, disabling snapshots",
            "Found version: 2.0.0",
        ]
    );
}

#[test]
fn missing_cli_disables_snapshots() {
    let c = captured_with(LoggerConfig::new());
    let percy = client(&unused_address());

    assert!(!percy.is_enabled(&c.logger));
    assert_eq!(percy.enabled(), Some(false));
    assert!(c.stdout.contents().contains("Percy is not running, disabling snapshots"));
}

#[test]
fn wait_for_idle_returns_true_when_idle() {
    let (address, _seen) = stub(|_| Reply::json(200, json!({"success": true})));
    assert!(client(&address).wait_for_idle());
}

#[test]
fn wait_for_idle_gives_up_on_other_errors() {
    let percy = PercyClient::new(
        ClientConfig::default()
            .with_address(unused_address())
            .with_idle_retry(BackoffPolicy {
                base: Duration::from_millis(10),
                cap: Duration::from_millis(20),
                deadline: Duration::from_millis(100),
            }),
    );
    assert!(!percy.wait_for_idle());
}

#[test]
fn dom_script_is_fetched_once() {
    let (address, seen) = stub(|_| Reply::text("window.PercyDOM = {};"));
    let percy = client(&address);

    assert_eq!(percy.fetch_dom().expect("dom"), "window.PercyDOM = {};");
    assert_eq!(percy.fetch_dom().expect("dom"), "window.PercyDOM = {};");
    assert_eq!(seen.try_iter().count(), 1);
}

#[test]
fn snapshot_posts_json_with_query() {
    let (address, seen) = stub(|_| Reply::json(200, json!({"success": true})));
    let percy = client(&address);
    let options = json!({"name": "Home page", "url": "http://localhost/"});

    percy
        .post_snapshot(&options, &[("client_info", "sdk/1.0 (test)")])
        .expect("posted");

    let request = seen.recv().expect("seen");
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/percy/snapshot?client_info=sdk%2F1.0+%28test%29");
    assert_eq!(serde_json::from_str::<Value>(&request.body).expect("json"), options);
}

#[test]
fn build_failure_disables_client() {
    let (address, _seen) = stub(|_| {
        Reply::json(400, json!({"error": "Build failed", "build": {"error": "Build failed"}}))
    });
    let percy = client(&address);

    let no_params: [(&str, &str); 0] = [];
    percy
        .post_snapshot(&json!({"name": "x"}), &no_params)
        .expect("swallowed");
    assert_eq!(percy.enabled(), Some(false));
}

#[test]
fn other_snapshot_failures_propagate() {
    let (address, _seen) = stub(|_| Reply::json(400, json!({"error": "Missing name"})));
    let percy = client(&address);

    let no_params: [(&str, &str); 0] = [];
    let err = percy
        .post_snapshot(&json!({}), &no_params)
        .expect_err("fails");
    assert!(matches!(err, ClientError::Response { ref message, .. } if message == "Missing name"));
    assert_eq!(percy.enabled(), None);
}
