use std::io::{self, BufRead};

use anyhow::Result;
use log::{error, info, warn};

use bioamp_rs::client::{BioampClient, BioampClientConfig};
use bioamp_rs::types::{CalibrationState, Severity};

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging ───────────────────────────────────────────────────────────────
    // Set RUST_LOG=debug for verbose output, e.g.:
    //   RUST_LOG=bioamp_rs=debug cargo run
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // ── Configuration ─────────────────────────────────────────────────────────
    // Optional first argument selects the serial port; otherwise the first
    // enumerated port is used.
    let config = BioampClientConfig {
        port_name: std::env::args().nth(1),
        ..BioampClientConfig::default()
    };

    match BioampClient::available_ports() {
        Ok(ports) if ports.is_empty() => warn!("No serial ports visible on this host."),
        Ok(ports) => info!("Serial ports: {}", ports.join(", ")),
        Err(e) => {
            error!("Serial access unavailable: {e:#}");
            return Err(e);
        }
    }

    // ── Connect ───────────────────────────────────────────────────────────────
    let client = BioampClient::new(config);

    info!("Connecting to BioAmp device …");
    let (mut rx, handle) = client.connect().await?;

    // Wrap in Arc so it can be shared between the command task and the main loop.
    let handle = std::sync::Arc::new(handle);

    info!("Streaming started. Press Ctrl-C or type 'q' + Enter to quit.\n");
    info!("Commands (type + Enter):");
    info!("  q  – quit");
    info!("  s  – print the current state snapshot\n");

    // ── Stdin command loop ────────────────────────────────────────────────────
    // We read lines on a dedicated OS thread (to avoid holding a non-Send
    // StdinLock across await points), then relay them to an async task.
    let (line_tx, mut line_rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) => {
                    if line_tx.send(l.trim().to_owned()).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let handle_cmd = std::sync::Arc::clone(&handle);
    tokio::spawn(async move {
        while let Some(line) = line_rx.recv().await {
            match line.as_str() {
                "" => continue,
                "q" => {
                    info!("Quit requested.");
                    handle_cmd.disconnect();
                }
                "s" => {
                    let snap = handle_cmd.snapshot();
                    let t = &snap.telemetry;
                    println!(
                        "[TELEMETRY] raw={:+.3}  filtered={:+.3}  envelope={:+.3}  \
                         threshold={:.3}  baseline={:.3}  quality={:.1}%",
                        t.raw_signal,
                        t.filtered_signal,
                        t.envelope,
                        t.threshold,
                        t.baseline,
                        t.signal_quality
                    );
                    let calibration = match snap.calibration {
                        CalibrationState::Idle => "idle".to_string(),
                        CalibrationState::InProgress { seconds_elapsed } => {
                            format!("in progress ({seconds_elapsed} s)")
                        }
                        CalibrationState::Complete => "complete".to_string(),
                    };
                    let i = &snap.interaction;
                    println!(
                        "[STATE] calibration={calibration}  menu={}  focus={}  last_selection={}",
                        if i.menu_active { "active" } else { "inactive" },
                        i.focused_option,
                        i.last_selection
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| "none".to_string()),
                    );
                }
                cmd => warn!("Unknown command '{cmd}' (try 'q' or 's')"),
            }
        }
    });

    // ── Main notice loop ──────────────────────────────────────────────────────
    // One line per human-relevant occurrence, mapped onto log levels.
    while let Some(notice) = rx.recv().await {
        match notice.severity {
            Severity::Info => info!("{}", notice.message),
            Severity::Success => info!("✅  {}", notice.message),
            Severity::Warning => warn!("{}", notice.message),
            Severity::Error => error!("{}", notice.message),
        }
    }

    info!("Notice stream finished – exiting.");
    Ok(())
}
