//! Wire tokens, serial-link constants, and payload conventions for the
//! BioAmp blink-controller line protocol.
//!
//! The protocol is plain newline-delimited ASCII. Every line is either a
//! discrete event token (optionally with a `:`-separated payload) or a
//! `DATA:` metrics record. There is no escaping and no quoting; the `DATA:`
//! field separator is a literal comma.

// ── Serial link ──────────────────────────────────────────────────────────────

/// Baud rate the firmware is flashed with. 8 data bits, 1 stop bit, no
/// parity, no flow control.
pub const BAUD_RATE: u32 = 115_200;

// ── Event tokens ─────────────────────────────────────────────────────────────
//
// Substring tokens match anywhere in the line; prefix tokens must start the
// line and are followed by a payload after the colon. Classification is
// first-match-wins in the order listed in [`crate::parse::decode_line`] —
// the order matters and must not be re-sorted.

/// A calibration run started (substring match).
pub const CALIBRATION_STARTED: &str = "CALIBRATION_STARTED";
/// The calibration run finished (substring match).
pub const CALIBRATION_COMPLETE: &str = "CALIBRATION_COMPLETE";
/// Calibration progress, integer seconds elapsed after the colon.
pub const CALIBRATION_PROGRESS: &str = "CALIBRATION_PROGRESS:";
/// A menu session opened (substring match).
pub const MENU_ACTIVATED: &str = "MENU_ACTIVATED";
/// The menu session closed explicitly (substring match).
pub const MENU_DEACTIVATED: &str = "MENU_DEACTIVATED";
/// The menu session timed out on the device (substring match).
pub const MENU_TIMEOUT: &str = "MENU_TIMEOUT";
/// Focus moved; 1-based option number after the colon.
pub const FOCUS_OPTION: &str = "FOCUS_OPTION:";
/// An option was confirmed; 1-based option number after the colon.
pub const OPTION_SELECTED: &str = "OPTION_SELECTED:";
/// The firmware registered a single (focus-cycling) blink (substring match).
pub const SINGLE_BLINK_FOCUS: &str = "SINGLE_BLINK_FOCUS";
/// The firmware registered a double (selecting) blink (substring match).
pub const DOUBLE_BLINK_SELECT: &str = "DOUBLE_BLINK_SELECT";
/// A blink passed the validity window; payload ignored.
pub const VALID_BLINK: &str = "VALID_BLINK:";
/// A blink was rejected; payload ignored.
pub const INVALID_BLINK: &str = "INVALID_BLINK:";
/// Full telemetry record, [`METRICS_FIELDS`] comma-separated fields.
pub const DATA: &str = "DATA:";
/// Standalone signal-quality reading, float after the colon.
pub const SIGNAL_QUALITY: &str = "SIGNAL_QUALITY:";

// ── Metrics payload ──────────────────────────────────────────────────────────

/// Field count of a well-formed `DATA:` record, in wire order:
/// raw, filtered, envelope, threshold, baseline, quality, menu flag,
/// focus option, calibrated flag.
///
/// Records with fewer fields are rejected whole (decoded as `Unknown`, no
/// partial update); excess trailing fields are ignored.
pub const METRICS_FIELDS: usize = 9;

/// Wire encoding of boolean flags: true iff the field is exactly `"1"`.
///
/// Anything else — `"0"`, `"true"`, an empty field — is false. Used for the
/// menu-active and calibrated flags of a `DATA:` record.
///
/// ```
/// # use bioamp_rs::protocol::flag_is_set;
/// assert!(flag_is_set("1"));
/// assert!(!flag_is_set("0"));
/// assert!(!flag_is_set("true"));
/// ```
pub fn flag_is_set(field: &str) -> bool {
    field == "1"
}

/// Duration of the stock firmware calibration routine in seconds; progress
/// lines report 0-based elapsed seconds, so notices render `n + 1` of this.
pub const CALIBRATION_SECS: u32 = 3;
