//! Application state driven by decoded protocol events.
//!
//! [`ControllerState`] owns the three state entities — telemetry snapshot,
//! calibration machine, interaction machine — and is the single writer:
//! the decode loop applies one event at a time, synchronously, so no reader
//! can observe a half-applied line. Every transition is an absolute set,
//! never an increment, which makes replaying any event a no-op-safe
//! operation.

use crate::protocol::CALIBRATION_SECS;
use crate::types::{
    BioampEvent, CalibrationState, InteractionState, Notice, Severity, TelemetrySnapshot,
};

/// All state owned by the controller, updated by [`ControllerState::apply`].
///
/// There are no ambient globals: the decode loop holds the one mutable
/// reference, and presentation collaborators read cloned snapshots through
/// [`crate::client::BioampHandle`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerState {
    /// Latest wholesale-replaced metrics record.
    pub telemetry: TelemetrySnapshot,
    /// Calibration lifecycle tracker.
    pub calibration: CalibrationState,
    /// Menu/focus/selection tracker.
    pub interaction: InteractionState,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decoded event and return the notices it produces for the
    /// notification sink.
    ///
    /// This is the per-line isolation boundary of the pipeline: it never
    /// fails, and an [`BioampEvent::Unknown`] event changes nothing except
    /// emitting one `Warning` notice. Each event updates exactly one state
    /// entity, with a single cross-entity side effect: calibration
    /// completion also raises the telemetry `calibrated` flag so both views
    /// agree without waiting for the next metrics line.
    pub fn apply(&mut self, event: &BioampEvent) -> Vec<Notice> {
        match event {
            BioampEvent::CalibrationStarted => {
                // Re-entrant: a new start restarts the cycle from any state,
                // including Complete.
                self.calibration = CalibrationState::InProgress { seconds_elapsed: 0 };
                vec![Notice::new(
                    "Calibration started - please remain still",
                    Severity::Info,
                )]
            }
            BioampEvent::CalibrationProgress(n) => {
                if let CalibrationState::InProgress { seconds_elapsed } = &mut self.calibration {
                    *seconds_elapsed = *n;
                }
                // Progress is 0-based on the wire; report 1-based seconds.
                vec![Notice::new(
                    format!("Calibration: {}/{} seconds", n + 1, CALIBRATION_SECS),
                    Severity::Info,
                )]
            }
            BioampEvent::CalibrationComplete => {
                self.calibration = CalibrationState::Complete;
                self.telemetry.calibrated = true;
                vec![Notice::new(
                    "Calibration complete - system ready",
                    Severity::Success,
                )]
            }
            BioampEvent::MenuActivated => {
                self.interaction.menu_active = true;
                vec![Notice::new("Menu activated", Severity::Info)]
            }
            BioampEvent::MenuDeactivated => {
                self.interaction.menu_active = false;
                vec![Notice::new("Menu deactivated", Severity::Info)]
            }
            BioampEvent::MenuTimeout => {
                // Same transition as MenuDeactivated; the distinguished
                // notice is the only observable difference.
                self.interaction.menu_active = false;
                vec![Notice::new("Menu timeout", Severity::Warning)]
            }
            BioampEvent::FocusChanged(option) => {
                // Applied even while the menu is inactive: the firmware owns
                // the menu session and is trusted to gate these itself.
                self.interaction.focused_option = *option;
                vec![Notice::new(
                    format!("Focus moved to option {option}"),
                    Severity::Info,
                )]
            }
            BioampEvent::OptionSelected(option) => {
                self.interaction.last_selection = Some(*option);
                vec![Notice::new(
                    format!("Option {option} selected"),
                    Severity::Success,
                )]
            }
            BioampEvent::SingleBlink => {
                // Presentation hint only; the firmware reports the actual
                // focus move separately via FOCUS_OPTION.
                vec![Notice::new("Blink: focus cycling", Severity::Info)]
            }
            BioampEvent::DoubleBlink => {
                vec![Notice::new("Double blink: select", Severity::Success)]
            }
            BioampEvent::ValidBlink => {
                vec![Notice::new("Valid blink detected", Severity::Success)]
            }
            BioampEvent::InvalidBlink => {
                vec![Notice::new("Invalid blink rejected", Severity::Warning)]
            }
            BioampEvent::Metrics(snapshot) => {
                self.telemetry = snapshot.clone();
                vec![]
            }
            BioampEvent::SignalQuality(quality) => {
                self.telemetry.signal_quality = *quality;
                vec![]
            }
            BioampEvent::Unknown(raw) => {
                vec![Notice::new(
                    format!("Unrecognised line: {raw:?}"),
                    Severity::Warning,
                )]
            }
        }
    }
}
