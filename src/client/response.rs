use std::collections::BTreeMap;
use std::io;

use serde_json::Value;

/// A response from the Percy CLI API.
///
/// `body` holds parsed JSON when the server declared `application/json` and
/// the text parsed; otherwise it holds the raw text as a JSON string.
#[derive(Clone, Debug, PartialEq)]
pub struct PercyResponse {
    pub status: u16,
    pub status_text: String,
    /// Header names are lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl PercyResponse {
    pub(crate) fn from_ureq(response: ureq::Response) -> io::Result<Self> {
        let status = response.status();
        let status_text = response.status_text().to_owned();
        let headers = response
            .headers_names()
            .into_iter()
            .filter_map(|name| {
                let value = response.header(&name)?.to_owned();
                Some((name.to_ascii_lowercase(), value))
            })
            .collect();
        let is_json = response.content_type() == "application/json";
        let text = response.into_string()?;
        let body = if is_json {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        } else {
            Value::String(text)
        };
        Ok(Self {
            status,
            status_text,
            headers,
            body,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `body.error` when the server supplied one, else `"<status> <text>"`.
    pub fn error_message(&self) -> String {
        match self.body.get("error").and_then(Value::as_str) {
            Some(message) => message.to_owned(),
            None => format!("{} {}", self.status, self.status_text),
        }
    }

    /// Body text, or the JSON rendering of a parsed body.
    pub fn text(&self) -> String {
        match &self.body {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}
