//! Serial connection management and the decode loop.
//!
//! [`BioampClient`] opens the serial link, reads raw chunks on a dedicated
//! OS thread (serial reads are blocking), and relays them to an async decode
//! task that assembles lines, decodes events, and applies them to the shared
//! [`ControllerState`]. Consumers receive [`Notice`]s through the
//! `mpsc::Receiver` returned by [`BioampClient::connect`] and read state
//! snapshots through [`BioampHandle`].
//!
//! Robustness contract: nothing that arrives on the wire can abort the
//! decode loop. Corrupted lines become `Unknown` events and a `Warning`
//! notice; only a transport error or end-of-stream terminates the loop, and
//! either exit path releases the port exactly once.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::parse::{decode_line, LineAssembler};
use crate::protocol::BAUD_RATE;
use crate::state::ControllerState;
use crate::types::{
    BioampEvent, CalibrationState, InteractionState, Notice, Severity, TelemetrySnapshot,
};

/// Capacity of the notice channel. Notices are low-rate (human-relevant
/// occurrences only); 256 absorbs a burst without blocking the decode task.
const NOTICE_CHANNEL_CAPACITY: usize = 256;

/// Blocking-read timeout on the serial port. This is also the latency with
/// which the reader thread notices a disconnect request.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

// ── Config ───────────────────────────────────────────────────────────────────

/// Configuration for [`BioampClient`].
#[derive(Debug, Clone)]
pub struct BioampClientConfig {
    /// Serial device to open (e.g. `/dev/ttyUSB0`, `COM3`). When `None`,
    /// the first enumerated port is used. Default: `None`.
    pub port_name: Option<String>,
    /// Baud rate. The stock firmware runs at 115 200, 8N1, no flow control.
    /// Default: [`BAUD_RATE`].
    pub baud_rate: u32,
}

impl Default for BioampClientConfig {
    fn default() -> Self {
        Self {
            port_name: None,
            baud_rate: BAUD_RATE,
        }
    }
}

// ── Chunk relay ──────────────────────────────────────────────────────────────

/// What the reader thread hands to the decode task.
enum Chunk {
    /// Raw text read from the port; boundaries are arbitrary and carry no
    /// relation to protocol lines.
    Data(String),
    /// The port reported end-of-stream (device unplugged cleanly).
    Eof,
    /// The link failed. Carries the error text for the notification sink.
    Error(String),
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Serial client for BioAmp blink-controller boards.
///
/// Handles port discovery, opening the link with the firmware's fixed
/// settings, and running the chunk → line → event → state pipeline. One
/// client connects once; drop the handle and receiver and connect again to
/// reconnect.
pub struct BioampClient {
    config: BioampClientConfig,
}

impl BioampClient {
    pub fn new(config: BioampClientConfig) -> Self {
        Self { config }
    }

    /// List the serial ports visible on this host, by name.
    ///
    /// Fails when the host has no serial capability at all; an empty list
    /// means the capability exists but no device is plugged in.
    pub fn available_ports() -> Result<Vec<String>> {
        let ports = serialport::available_ports()
            .context("serial port enumeration is not supported on this host")?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    /// Open the configured (or first available) port and start streaming.
    ///
    /// Returns the notice receiver and a [`BioampHandle`] for snapshot reads
    /// and disconnecting. Pre-connection failures — no serial capability, no
    /// device, open refused — surface as `Err` before any resource is held;
    /// failures after this point arrive as `Error` notices instead and
    /// terminate the stream without propagating.
    pub async fn connect(&self) -> Result<(mpsc::Receiver<Notice>, BioampHandle)> {
        // Capability probe before any connection attempt.
        let ports = Self::available_ports()?;

        let port_name = match &self.config.port_name {
            Some(name) => {
                if !ports.iter().any(|p| p == name) {
                    warn!("configured port {name} not among enumerated ports {ports:?}");
                }
                name.clone()
            }
            None => ports
                .first()
                .cloned()
                .ok_or_else(|| anyhow!("no serial device found"))?,
        };

        let (tx, rx) = mpsc::channel::<Notice>(NOTICE_CHANNEL_CAPACITY);
        let _ = tx
            .send(Notice::new(
                format!("Requesting serial connection to {port_name}"),
                Severity::Info,
            ))
            .await;

        info!("opening {port_name} at {} baud 8N1", self.config.baud_rate);
        let port = serialport::new(&port_name, self.config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .with_context(|| format!("could not open {port_name}"))?;

        let _ = tx
            .send(Notice::new(
                format!("Connected to BioAmp system on {port_name}"),
                Severity::Success,
            ))
            .await;

        let state = Arc::new(Mutex::new(ControllerState::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        // ── Reader thread ────────────────────────────────────────────────────
        // Serial reads block, so they live on a dedicated OS thread (the same
        // shape as reading stdin on a thread and relaying to async). The
        // thread owns the port: whichever way it exits — EOF, link error, or
        // a disconnect request — the port is dropped exactly once.
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel::<Chunk>();
        let reader_shutdown = Arc::clone(&shutdown);
        thread::spawn(move || {
            let mut port = port;
            let mut buf = [0u8; 1024];
            loop {
                if reader_shutdown.load(Ordering::SeqCst) {
                    debug!("reader: disconnect requested, closing port");
                    break;
                }
                match port.read(&mut buf) {
                    Ok(0) => {
                        let _ = chunk_tx.send(Chunk::Eof);
                        break;
                    }
                    Ok(n) => {
                        // Lossy: a corrupt byte must not kill the stream;
                        // downstream classifies the garbled line as Unknown.
                        let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                        if chunk_tx.send(Chunk::Data(text)).is_err() {
                            break; // decode task is gone
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                    Err(e) => {
                        let _ = chunk_tx.send(Chunk::Error(e.to_string()));
                        break;
                    }
                }
            }
            reader_shutdown.store(true, Ordering::SeqCst);
        });

        // ── Decode task ──────────────────────────────────────────────────────
        tokio::spawn(run_decode_loop(chunk_rx, Arc::clone(&state), tx));

        let handle = BioampHandle {
            port_name,
            state,
            shutdown,
        };
        Ok((rx, handle))
    }
}

/// The single-writer pipeline: chunks in, lines assembled, events decoded
/// and applied, notices out. One line's decode-and-apply completes before
/// the next line is looked at, so readers only ever see settled state.
async fn run_decode_loop(
    mut chunk_rx: mpsc::UnboundedReceiver<Chunk>,
    state: Arc<Mutex<ControllerState>>,
    tx: mpsc::Sender<Notice>,
) {
    let mut assembler = LineAssembler::new();
    let mut line_count: u64 = 0;

    while let Some(chunk) = chunk_rx.recv().await {
        match chunk {
            Chunk::Data(text) => {
                for line in assembler.push(&text) {
                    line_count += 1;
                    apply_line(&line, &state, &tx).await;
                }
            }
            Chunk::Eof => {
                info!("serial stream ended after {line_count} lines");
                break;
            }
            Chunk::Error(msg) => {
                warn!("serial link error after {line_count} lines: {msg}");
                let _ = tx
                    .send(Notice::new(
                        format!("Serial communication error: {msg}"),
                        Severity::Error,
                    ))
                    .await;
                break;
            }
        }
    }

    // A final line without a trailing newline still counts.
    if let Some(line) = assembler.flush() {
        apply_line(&line, &state, &tx).await;
    }

    let _ = tx
        .send(Notice::new("Disconnected from device", Severity::Info))
        .await;
}

/// Decode one line and apply it atomically to the shared state, forwarding
/// the resulting notices. Never fails; unknown lines are logged and warned.
async fn apply_line(line: &str, state: &Arc<Mutex<ControllerState>>, tx: &mpsc::Sender<Notice>) {
    let event = decode_line(line);
    if let BioampEvent::Unknown(raw) = &event {
        debug!("unrecognised line: {raw:?}");
    }
    let notices = state
        .lock()
        .expect("controller state mutex poisoned")
        .apply(&event);
    for notice in notices {
        let _ = tx.send(notice).await;
    }
}

// ── Handle ───────────────────────────────────────────────────────────────────

/// A handle to an active connection: read-only state snapshots for the
/// presentation layer, plus disconnect.
///
/// Snapshot reads are cheap clones of settled values; there is no way to
/// observe a half-applied line through this handle.
pub struct BioampHandle {
    port_name: String,
    state: Arc<Mutex<ControllerState>>,
    shutdown: Arc<AtomicBool>,
}

impl BioampHandle {
    /// Name of the connected serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// The latest telemetry snapshot.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.lock_state().telemetry.clone()
    }

    /// Current calibration lifecycle state.
    pub fn calibration(&self) -> CalibrationState {
        self.lock_state().calibration
    }

    /// Current menu/focus/selection state.
    pub fn interaction(&self) -> InteractionState {
        self.lock_state().interaction
    }

    /// All three state entities as one consistent snapshot.
    pub fn snapshot(&self) -> ControllerState {
        self.lock_state().clone()
    }

    /// Whether the link is still up. Becomes false after [`disconnect`]
    /// or when the reader thread exits on EOF or a link error.
    ///
    /// [`disconnect`]: BioampHandle::disconnect
    pub fn is_connected(&self) -> bool {
        !self.shutdown.load(Ordering::SeqCst)
    }

    /// Request disconnection. Idempotent: the reader thread owns the port
    /// and drops it exactly once on exit, so calling this any number of
    /// times (or racing it with a link failure) is safe.
    pub fn disconnect(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            info!("disconnect requested for {}", self.port_name);
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ControllerState> {
        self.state.lock().expect("controller state mutex poisoned")
    }
}
