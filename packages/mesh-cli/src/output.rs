//! Output rendering for the three CLI formats.
//!
//! Every command renders through a [`Printer`] so the format contract
//! stays in one place: `human` is the default conversational output,
//! `json` is a stable envelope for scripts and agents, `raw` is bare
//! values for shell pipelines. Errors in JSON mode go to stdout inside
//! the envelope; in the other modes they go to stderr.

use mesh_core::Error;
use serde::Serialize;
use serde_json::json;

/// Output format, selected by global flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Conversational output for people
    Human,
    /// `{"ok": ..., "result"|"error": ...}` envelopes
    Json,
    /// Bare values, one per line
    Raw,
}

/// Renders command output in the selected format.
pub struct Printer {
    format: Format,
    quiet: bool,
}

impl Printer {
    /// Select a format from the global flags. `--raw` wins over `--json`.
    pub fn new(json: bool, raw: bool, quiet: bool) -> Self {
        let format = if raw {
            Format::Raw
        } else if json {
            Format::Json
        } else {
            Format::Human
        };
        Self { format, quiet }
    }

    /// The selected format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Primary output, never suppressed.
    pub fn line(&self, text: impl AsRef<str>) {
        println!("{}", text.as_ref());
    }

    /// Decorative status line: human format only, suppressed by `--quiet`.
    pub fn note(&self, text: impl AsRef<str>) {
        if self.format == Format::Human && !self.quiet {
            println!("{}", text.as_ref());
        }
    }

    /// Print the JSON success envelope.
    pub fn ok<T: Serialize>(&self, result: &T) {
        println!("{}", render_ok(result));
    }

    /// Print an error in the selected format.
    pub fn error(&self, err: &Error) {
        if self.format == Format::Json {
            println!("{}", render_error(err));
        } else {
            eprintln!("error: {err}");
        }
    }
}

fn render_ok<T: Serialize>(result: &T) -> String {
    json!({ "ok": true, "result": result }).to_string()
}

fn render_error(err: &Error) -> String {
    json!({
        "ok": false,
        "error": { "code": err.code(), "message": err.to_string() },
    })
    .to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_wins_over_json() {
        assert_eq!(Printer::new(true, true, false).format(), Format::Raw);
        assert_eq!(Printer::new(true, false, false).format(), Format::Json);
        assert_eq!(Printer::new(false, false, false).format(), Format::Human);
    }

    #[test]
    fn error_envelope_carries_stable_code() {
        let rendered = render_error(&Error::KeyNotFound);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"]["code"], "key_not_found");
        assert!(value["error"]["message"].as_str().unwrap().contains("key"));
    }

    #[test]
    fn success_envelope_wraps_result() {
        let rendered = render_ok(&json!({ "id": "dm_1" }));
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["result"]["id"], "dm_1");
    }
}
