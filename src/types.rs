/// The full telemetry tuple carried by one `DATA:` line.
///
/// The board emits these continuously once streaming starts. Every valid
/// metrics line replaces the previous snapshot wholesale — there is no
/// partial merge, so a snapshot is always internally consistent. A malformed
/// metrics line (fewer than 9 fields) leaves the previous snapshot untouched.
///
/// Signal processing happens on the firmware: `raw_signal` through `baseline`
/// arrive pre-filtered and pre-enveloped; this crate only decodes them.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    /// Raw ADC sample, in firmware units.
    pub raw_signal: f64,
    /// Band-pass filtered signal.
    pub filtered_signal: f64,
    /// Rectified envelope of the filtered signal.
    pub envelope: f64,
    /// Current blink-detection threshold computed by the firmware.
    pub threshold: f64,
    /// Resting baseline established during calibration.
    pub baseline: f64,
    /// Electrode contact quality in percent (0–100).
    pub signal_quality: f64,
    /// Firmware's own menu-session flag, as reported on the wire.
    pub menu_active: bool,
    /// Menu option the firmware currently highlights (1-based).
    pub focus_option: u32,
    /// Whether the firmware considers itself calibrated.
    pub calibrated: bool,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            raw_signal: 0.0,
            filtered_signal: 0.0,
            envelope: 0.0,
            threshold: 0.0,
            baseline: 0.0,
            signal_quality: 0.0,
            menu_active: false,
            focus_option: 1,
            calibrated: false,
        }
    }
}

/// Calibration lifecycle, driven only by decoded calibration events.
///
/// `CALIBRATION_STARTED` always restarts the cycle — including from
/// [`CalibrationState::Complete`] — so a board that re-calibrates after an
/// electrode shift is tracked correctly. `Complete` persists until the next
/// start; there is no automatic expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationState {
    /// No calibration run has started since connect.
    #[default]
    Idle,
    /// A run is underway. `seconds_elapsed` is the raw wire value (0–2 for
    /// the stock 3-second firmware routine); it is set absolutely from each
    /// `CALIBRATION_PROGRESS:` line, never incremented.
    InProgress { seconds_elapsed: u32 },
    /// The firmware reported `CALIBRATION_COMPLETE`.
    Complete,
}

/// Menu activation, focus, and selection as reported by the firmware.
///
/// The firmware performs the actual blink-to-cycle and blink-to-select logic;
/// this state only mirrors what it reports. Focus and selection updates are
/// applied regardless of `menu_active` — the board is trusted to emit them
/// only during its own menu sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionState {
    /// True between `MENU_ACTIVATED` and the next deactivation or timeout.
    pub menu_active: bool,
    /// Currently highlighted option (1-based). Changes only on
    /// `FOCUS_OPTION:` lines.
    pub focused_option: u32,
    /// Most recent confirmed selection, if any. Survives menu deactivation:
    /// selection history persists across menu sessions.
    pub last_selection: Option<u32>,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            menu_active: false,
            focused_option: 1,
            last_selection: None,
        }
    }
}

/// One decoded protocol line.
///
/// Produced by [`crate::parse::decode_line`], which is total: every input
/// line maps to exactly one variant, with [`BioampEvent::Unknown`] as the
/// catch-all. Events are ephemeral — each one is applied to
/// [`crate::state::ControllerState`] and discarded.
///
/// | Variant | Wire form |
/// |---|---|
/// | `CalibrationStarted` | contains `CALIBRATION_STARTED` |
/// | `CalibrationComplete` | contains `CALIBRATION_COMPLETE` |
/// | `CalibrationProgress` | `CALIBRATION_PROGRESS:<n>` |
/// | `MenuActivated` | contains `MENU_ACTIVATED` |
/// | `MenuDeactivated` | contains `MENU_DEACTIVATED` |
/// | `MenuTimeout` | contains `MENU_TIMEOUT` |
/// | `FocusChanged` | `FOCUS_OPTION:<n>` |
/// | `OptionSelected` | `OPTION_SELECTED:<n>` |
/// | `SingleBlink` | contains `SINGLE_BLINK_FOCUS` |
/// | `DoubleBlink` | contains `DOUBLE_BLINK_SELECT` |
/// | `ValidBlink` | prefix `VALID_BLINK:` |
/// | `InvalidBlink` | prefix `INVALID_BLINK:` |
/// | `Metrics` | `DATA:<9 comma-separated fields>` |
/// | `SignalQuality` | `SIGNAL_QUALITY:<float>` |
/// | `Unknown` | anything else |
#[derive(Debug, Clone, PartialEq)]
pub enum BioampEvent {
    /// A calibration run has started; the tracker restarts unconditionally.
    CalibrationStarted,
    /// The current run finished; also sets the telemetry `calibrated` flag.
    CalibrationComplete,
    /// Seconds elapsed in the current run (non-numeric payload decodes as 0).
    CalibrationProgress(u32),
    /// The firmware opened a menu session.
    MenuActivated,
    /// The firmware closed the menu session explicitly.
    MenuDeactivated,
    /// The firmware closed the menu session because it timed out.
    /// State-wise identical to [`BioampEvent::MenuDeactivated`]; the only
    /// observable difference is the distinguished timeout notice.
    MenuTimeout,
    /// Focus moved to the given option (non-numeric payload decodes as 1).
    FocusChanged(u32),
    /// The given option was confirmed (non-numeric payload decodes as 1).
    OptionSelected(u32),
    /// Presentation hint: the firmware registered a focus-cycling blink.
    SingleBlink,
    /// Presentation hint: the firmware registered a selecting double blink.
    DoubleBlink,
    /// Informational: a blink passed the firmware's validity window.
    ValidBlink,
    /// Informational: a blink was rejected by the firmware.
    InvalidBlink,
    /// A full telemetry tuple; replaces the previous snapshot wholesale.
    Metrics(TelemetrySnapshot),
    /// A standalone signal-quality reading (non-numeric payload decodes as 0).
    SignalQuality(f64),
    /// Anything unrecognised, including short `DATA:` records. Carries the
    /// raw line so the notification sink can report it.
    Unknown(String),
}

/// Severity of a [`Notice`], matching the four log classes of the firmware's
/// companion UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// One human-readable occurrence for the notification sink: connect and
/// disconnect, calibration phase transitions, blink/selection/timeout events,
/// and one `Warning` per unrecognised line.
///
/// Notices flow out of [`crate::client::BioampClient::connect`] over an mpsc
/// channel and never feed back into parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}
