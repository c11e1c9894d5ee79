//! # bioamp-rs
//!
//! Async Rust client for BioAmp-based EEG blink-controller boards that speak
//! the newline-delimited serial protocol (Arduino + BioAmp EXG front-end,
//! 115 200 baud 8N1).
//!
//! The firmware does all the signal processing — filtering, envelope
//! detection, blink thresholding, menu cycling — and streams the results as
//! text lines. This crate decodes those lines and turns them into three
//! pieces of application state:
//!
//! * a live [`types::TelemetrySnapshot`] (signal values, quality, flags),
//! * a [`types::CalibrationState`] lifecycle tracker,
//! * an [`types::InteractionState`] menu/focus/selection tracker,
//!
//! plus a stream of human-readable [`types::Notice`]s for whatever UI sits
//! on top. Corrupt or unrecognised lines can never stall the stream: the
//! decoder is total and every failure is isolated to its own line.
//!
//! ## Quick start
//!
//! ```no_run
//! use bioamp_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BioampClient::new(BioampClientConfig::default());
//!     let (mut notices, handle) = client.connect().await?;
//!
//!     while let Some(notice) = notices.recv().await {
//!         println!("[{:?}] {}", notice.severity, notice.message);
//!         if let CalibrationState::Complete = handle.calibration() {
//!             println!("quality: {:.0}%", handle.telemetry().signal_quality);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`prelude`] | One-line glob import of the most commonly needed types |
//! | [`client`] | Serial port discovery, the decode loop, and the [`client::BioampHandle`] snapshot API |
//! | [`types`] | All state, event, and notice types produced by the client |
//! | [`protocol`] | Wire tokens, serial-link constants, and payload conventions |
//! | [`parse`] | Chunk-to-line assembly and the line-to-event decoder |
//! | [`state`] | The calibration and interaction state machines |

pub mod client;
pub mod parse;
pub mod protocol;
pub mod state;
pub mod types;

// ── Prelude ───────────────────────────────────────────────────────────────────

/// Convenience re-exports for downstream crates.
///
/// A single glob import covers the surface area needed to connect to a board
/// and consume its state:
///
/// ```no_run
/// use bioamp_rs::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let ports = BioampClient::available_ports()?;
/// let config = BioampClientConfig {
///     port_name: ports.into_iter().next(),
///     ..BioampClientConfig::default()
/// };
/// let (mut notices, handle) = BioampClient::new(config).connect().await?;
/// while let Some(n) = notices.recv().await {
///     println!("{}", n.message);
/// }
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    // ── Client ────────────────────────────────────────────────────────────────
    pub use crate::client::{BioampClient, BioampClientConfig, BioampHandle};

    // ── State, events, and notices ────────────────────────────────────────────
    pub use crate::state::ControllerState;
    pub use crate::types::{
        BioampEvent, CalibrationState, InteractionState, Notice, Severity, TelemetrySnapshot,
    };

    // ── Protocol constants ────────────────────────────────────────────────────
    pub use crate::protocol::{BAUD_RATE, CALIBRATION_SECS, METRICS_FIELDS};
}
