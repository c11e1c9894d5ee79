//! Text decoders for the BioAmp serial line protocol.
//!
//! All public items in this module are pure (no I/O, no state beyond the
//! [`LineAssembler`] tail buffer) and are safe to call from any async or
//! sync context.
//!
//! Decoding is two-stage:
//!
//! 1. [`LineAssembler`] turns arbitrarily chunked serial text into discrete,
//!    trimmed, non-empty lines, buffering an unterminated tail across chunk
//!    boundaries.
//! 2. [`decode_line`] classifies one line into a [`BioampEvent`]. It is
//!    total: malformed or unrecognised input decodes to
//!    [`BioampEvent::Unknown`] rather than failing, so a corrupted line can
//!    never abort processing of the lines after it.

use crate::protocol::{
    flag_is_set, CALIBRATION_COMPLETE, CALIBRATION_PROGRESS, CALIBRATION_STARTED, DATA,
    DOUBLE_BLINK_SELECT, FOCUS_OPTION, INVALID_BLINK, MENU_ACTIVATED, MENU_DEACTIVATED,
    MENU_TIMEOUT, METRICS_FIELDS, OPTION_SELECTED, SIGNAL_QUALITY, SINGLE_BLINK_FOCUS, VALID_BLINK,
};
use crate::types::{BioampEvent, TelemetrySnapshot};

// ── Frame splitting ──────────────────────────────────────────────────────────

/// Incrementally splits chunked serial text into complete protocol lines.
///
/// Serial reads do not respect line boundaries: one chunk may carry half a
/// line, several lines, or no newline at all. The assembler buffers the
/// unterminated tail and emits a line only once its `\n` arrives (or on
/// [`flush`](LineAssembler::flush) at end of stream). Emitted lines are
/// trimmed of surrounding whitespace — which also swallows `\r` from CRLF
/// firmware builds — and empty lines are dropped.
///
/// The split is segmentation-invariant: any way of cutting the same total
/// text into chunks yields the same sequence of lines.
///
/// # Usage
///
/// ```
/// # use bioamp_rs::parse::LineAssembler;
/// let mut asm = LineAssembler::new();
/// assert_eq!(asm.push("MENU_ACT"), Vec::<String>::new()); // incomplete
/// assert_eq!(asm.push("IVATED\nDATA:"), vec!["MENU_ACTIVATED"]);
/// assert_eq!(asm.flush(), Some("DATA:".to_string()));
/// ```
#[derive(Debug, Default)]
pub struct LineAssembler {
    /// Text after the last newline seen so far.
    tail: String,
}

impl LineAssembler {
    /// Create a new assembler with an empty tail buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line completed by it, in order.
    ///
    /// A chunk may complete zero, one, or many lines. Lines are trimmed and
    /// blank lines are discarded; there is no line length limit.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        let mut lines = Vec::new();
        for ch in chunk.chars() {
            if ch == '\n' {
                let line = self.tail.trim();
                if !line.is_empty() {
                    lines.push(line.to_owned());
                }
                self.tail.clear();
            } else {
                self.tail.push(ch);
            }
        }
        lines
    }

    /// Emit the buffered unterminated tail, if any, and reset.
    ///
    /// Call once when the transport signals end of stream so a final line
    /// without a trailing newline is not silently dropped.
    pub fn flush(&mut self) -> Option<String> {
        let line = self.tail.trim().to_owned();
        self.tail.clear();
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }
}

// ── Payload helpers ──────────────────────────────────────────────────────────

/// Parse the text after the first `:` as an integer, with a fallback for
/// non-numeric payloads. The fallback differs per token: 0 for calibration
/// progress, 1 for focus and selection (option numbers are 1-based).
fn int_payload(line: &str, fallback: u32) -> u32 {
    line.split_once(':')
        .and_then(|(_, payload)| payload.trim().parse().ok())
        .unwrap_or(fallback)
}

/// Parse the text after the first `:` as a float, falling back to 0.
fn float_payload(line: &str) -> f64 {
    line.split_once(':')
        .and_then(|(_, payload)| payload.trim().parse().ok())
        .unwrap_or(0.0)
}

/// Parse one numeric metrics field, falling back to 0 on failure.
///
/// Field-level fallback, not record-level: one garbled number zeroes that
/// field only and the rest of the record still applies.
fn metric(field: &str) -> f64 {
    field.trim().parse().unwrap_or(0.0)
}

/// Decode the payload of a `DATA:` line into a [`TelemetrySnapshot`].
///
/// Returns `None` when fewer than [`METRICS_FIELDS`] fields are present —
/// a short record must not produce a partial update. Excess trailing fields
/// are ignored.
fn decode_metrics(payload: &str) -> Option<TelemetrySnapshot> {
    let fields: Vec<&str> = payload.split(',').collect();
    if fields.len() < METRICS_FIELDS {
        return None;
    }
    Some(TelemetrySnapshot {
        raw_signal: metric(fields[0]),
        filtered_signal: metric(fields[1]),
        envelope: metric(fields[2]),
        threshold: metric(fields[3]),
        baseline: metric(fields[4]),
        signal_quality: metric(fields[5]),
        menu_active: flag_is_set(fields[6].trim()),
        focus_option: fields[7].trim().parse().unwrap_or(1),
        calibrated: flag_is_set(fields[8].trim()),
    })
}

// ── Line classification ──────────────────────────────────────────────────────

/// Classify and decode one trimmed protocol line.
///
/// Total over all inputs: anything unrecognised — including a `DATA:` record
/// with fewer than 9 fields — becomes [`BioampEvent::Unknown`] carrying the
/// raw line. Matching is first-match-wins in the fixed order below; some
/// tokens can occur as substrings of unrelated lines, so the order is part
/// of the wire contract and must not be re-sorted.
///
/// ```
/// # use bioamp_rs::parse::decode_line;
/// # use bioamp_rs::types::BioampEvent;
/// assert_eq!(decode_line("FOCUS_OPTION:3"), BioampEvent::FocusChanged(3));
/// assert_eq!(decode_line("FOCUS_OPTION:???"), BioampEvent::FocusChanged(1));
/// assert!(matches!(decode_line("garbage"), BioampEvent::Unknown(_)));
/// ```
pub fn decode_line(line: &str) -> BioampEvent {
    if line.contains(CALIBRATION_STARTED) {
        BioampEvent::CalibrationStarted
    } else if line.contains(CALIBRATION_COMPLETE) {
        BioampEvent::CalibrationComplete
    } else if line.starts_with(CALIBRATION_PROGRESS) {
        BioampEvent::CalibrationProgress(int_payload(line, 0))
    } else if line.contains(MENU_ACTIVATED) {
        BioampEvent::MenuActivated
    } else if line.contains(MENU_DEACTIVATED) {
        BioampEvent::MenuDeactivated
    } else if line.contains(MENU_TIMEOUT) {
        BioampEvent::MenuTimeout
    } else if line.starts_with(FOCUS_OPTION) {
        BioampEvent::FocusChanged(int_payload(line, 1))
    } else if line.starts_with(OPTION_SELECTED) {
        BioampEvent::OptionSelected(int_payload(line, 1))
    } else if line.contains(SINGLE_BLINK_FOCUS) {
        BioampEvent::SingleBlink
    } else if line.contains(DOUBLE_BLINK_SELECT) {
        BioampEvent::DoubleBlink
    } else if line.starts_with(VALID_BLINK) {
        BioampEvent::ValidBlink
    } else if line.starts_with(INVALID_BLINK) {
        BioampEvent::InvalidBlink
    } else if let Some(payload) = line.strip_prefix(DATA) {
        match decode_metrics(payload) {
            Some(snapshot) => BioampEvent::Metrics(snapshot),
            None => BioampEvent::Unknown(line.to_owned()),
        }
    } else if line.starts_with(SIGNAL_QUALITY) {
        BioampEvent::SignalQuality(float_payload(line))
    } else {
        BioampEvent::Unknown(line.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── LineAssembler ────────────────────────────────────────────────────────

    /// Feed `text` in chunks of `step` characters and collect all lines.
    fn split_in_chunks(text: &str, step: usize) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut asm = LineAssembler::new();
        let mut lines = Vec::new();
        for chunk in chars.chunks(step) {
            lines.extend(asm.push(&chunk.iter().collect::<String>()));
        }
        lines.extend(asm.flush());
        lines
    }

    #[test]
    fn splitting_is_segmentation_invariant() {
        let text = "DATA:1,2,3,4,5,6,1,2,1\r\nMENU_ACTIVATED\n\nFOCUS_OPTION:2\nVALID_BLINK:90";
        let whole = split_in_chunks(text, text.len());
        for step in 1..=text.len() {
            assert_eq!(split_in_chunks(text, step), whole, "chunk size {step}");
        }
        assert_eq!(
            whole,
            vec![
                "DATA:1,2,3,4,5,6,1,2,1",
                "MENU_ACTIVATED",
                "FOCUS_OPTION:2",
                "VALID_BLINK:90",
            ]
        );
    }

    #[test]
    fn tail_is_buffered_until_terminated() {
        let mut asm = LineAssembler::new();
        assert!(asm.push("CALIBRATION_").is_empty());
        assert!(asm.push("STAR").is_empty());
        assert_eq!(asm.push("TED\n"), vec!["CALIBRATION_STARTED"]);
        assert_eq!(asm.flush(), None);
    }

    #[test]
    fn blank_and_whitespace_lines_are_dropped() {
        let mut asm = LineAssembler::new();
        assert!(asm.push("\n  \n\r\n\t\n").is_empty());
        assert_eq!(asm.flush(), None);
    }

    #[test]
    fn flush_emits_unterminated_tail_once() {
        let mut asm = LineAssembler::new();
        asm.push("MENU_TIMEOUT");
        assert_eq!(asm.flush(), Some("MENU_TIMEOUT".to_string()));
        assert_eq!(asm.flush(), None);
    }

    #[test]
    fn many_lines_per_chunk() {
        let mut asm = LineAssembler::new();
        assert_eq!(
            asm.push("A\nB\nC\n"),
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
    }

    // ── decode_line: classification table ────────────────────────────────────

    #[test]
    fn classifies_every_token() {
        use BioampEvent::*;
        let cases: Vec<(&str, BioampEvent)> = vec![
            ("CALIBRATION_STARTED", CalibrationStarted),
            ("CALIBRATION_COMPLETE", CalibrationComplete),
            ("CALIBRATION_PROGRESS:1", CalibrationProgress(1)),
            ("MENU_ACTIVATED", MenuActivated),
            ("MENU_DEACTIVATED", MenuDeactivated),
            ("MENU_TIMEOUT", MenuTimeout),
            ("FOCUS_OPTION:4", FocusChanged(4)),
            ("OPTION_SELECTED:2", OptionSelected(2)),
            ("SINGLE_BLINK_FOCUS", SingleBlink),
            ("DOUBLE_BLINK_SELECT", DoubleBlink),
            ("VALID_BLINK:123", ValidBlink),
            ("INVALID_BLINK:too_short", InvalidBlink),
            ("SIGNAL_QUALITY:87.5", SignalQuality(87.5)),
        ];
        for (line, expected) in cases {
            assert_eq!(decode_line(line), expected, "line {line:?}");
        }
    }

    #[test]
    fn substring_tokens_match_mid_line() {
        // Substring rules fire even with a prefix, e.g. firmware debug noise.
        assert_eq!(
            decode_line("[dbg] CALIBRATION_STARTED t=1200"),
            BioampEvent::CalibrationStarted
        );
        assert_eq!(
            decode_line("evt=MENU_TIMEOUT after 10s"),
            BioampEvent::MenuTimeout
        );
    }

    #[test]
    fn prefix_tokens_do_not_match_mid_line() {
        // FOCUS_OPTION is a prefix rule: a line merely containing it is not
        // a focus event.
        assert!(matches!(
            decode_line("note FOCUS_OPTION:9"),
            BioampEvent::Unknown(_)
        ));
    }

    #[test]
    fn calibration_tokens_win_over_later_rules() {
        // First-match-wins: a line carrying two tokens resolves to the one
        // earlier in the table.
        assert_eq!(
            decode_line("CALIBRATION_STARTED MENU_ACTIVATED"),
            BioampEvent::CalibrationStarted
        );
    }

    // ── decode_line: payload fallbacks ───────────────────────────────────────

    #[test]
    fn non_numeric_progress_falls_back_to_zero() {
        assert_eq!(
            decode_line("CALIBRATION_PROGRESS:abc"),
            BioampEvent::CalibrationProgress(0)
        );
    }

    #[test]
    fn non_numeric_focus_and_selection_fall_back_to_one() {
        assert_eq!(decode_line("FOCUS_OPTION:x"), BioampEvent::FocusChanged(1));
        assert_eq!(
            decode_line("OPTION_SELECTED:"),
            BioampEvent::OptionSelected(1)
        );
    }

    #[test]
    fn non_numeric_signal_quality_falls_back_to_zero() {
        assert_eq!(
            decode_line("SIGNAL_QUALITY:n/a"),
            BioampEvent::SignalQuality(0.0)
        );
    }

    // ── decode_line: metrics records ─────────────────────────────────────────

    #[test]
    fn full_metrics_record_decodes_field_by_field() {
        let event = decode_line("DATA:1.0,2.0,3.0,0.5,1.2,87.5,1,3,1");
        assert_eq!(
            event,
            BioampEvent::Metrics(TelemetrySnapshot {
                raw_signal: 1.0,
                filtered_signal: 2.0,
                envelope: 3.0,
                threshold: 0.5,
                baseline: 1.2,
                signal_quality: 87.5,
                menu_active: true,
                focus_option: 3,
                calibrated: true,
            })
        );
    }

    #[test]
    fn short_metrics_record_is_unknown() {
        // Fewer than 9 fields: reject the whole line, no partial update.
        assert_eq!(
            decode_line("DATA:1,2,3"),
            BioampEvent::Unknown("DATA:1,2,3".to_string())
        );
    }

    #[test]
    fn excess_metrics_fields_are_ignored() {
        let event = decode_line("DATA:1,2,3,4,5,6,0,2,0,99,99");
        match event {
            BioampEvent::Metrics(s) => {
                assert_eq!(s.focus_option, 2);
                assert!(!s.calibrated);
            }
            other => panic!("expected Metrics, got {other:?}"),
        }
    }

    #[test]
    fn garbled_numeric_field_zeroes_only_itself() {
        let event = decode_line("DATA:1.0,garbage,3.0,0.5,1.2,87.5,1,3,1");
        match event {
            BioampEvent::Metrics(s) => {
                assert_eq!(s.raw_signal, 1.0);
                assert_eq!(s.filtered_signal, 0.0);
                assert_eq!(s.envelope, 3.0);
            }
            other => panic!("expected Metrics, got {other:?}"),
        }
    }

    #[test]
    fn boolean_flags_require_literal_one() {
        let event = decode_line("DATA:1,2,3,4,5,6,true,3,01");
        match event {
            BioampEvent::Metrics(s) => {
                assert!(!s.menu_active);
                assert!(!s.calibrated);
            }
            other => panic!("expected Metrics, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_focus_field_falls_back_to_one() {
        let event = decode_line("DATA:1,2,3,4,5,6,1,huh,1");
        match event {
            BioampEvent::Metrics(s) => assert_eq!(s.focus_option, 1),
            other => panic!("expected Metrics, got {other:?}"),
        }
    }

    #[test]
    fn arbitrary_garbage_is_unknown_not_an_error() {
        for line in ["", "~~~", "DATA", "0xff 0x00", "<<<<<<<", "DATAA:1,2"] {
            // decode_line is total; the catch-all must hold for anything.
            match decode_line(line) {
                BioampEvent::Unknown(raw) => assert_eq!(raw, line),
                other => panic!("line {line:?} decoded to {other:?}"),
            }
        }
    }
}
