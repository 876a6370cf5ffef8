pub mod alerts;
pub mod buffs;
pub mod config;
pub mod cues;
pub mod engine;
pub mod ipc;
pub mod reader;
pub mod state;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, watch};

pub use buffs::{classify, extract_stacks, BuffId};
pub use config::MonitorConfig;
pub use cues::CueKind;
pub use engine::{Monitor, MonitorHandle, TickOutcome};
pub use ipc::{OverlayEvent, OverlaySink, Presentation, Sound, SoundCue};
pub use reader::{FrameReader, RawBuffReading, ReaderError, VitalSample};

/// Capacity of the overlay event channel handed back by `start`.
const OVERLAY_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Logging: write to a daily rolling log file in `log_dir`.
// ---------------------------------------------------------------------------

/// Install the global tracing subscriber and a panic hook.
///
/// Call once, early, from the host. Panics are routed through tracing so they
/// end up in the log file instead of an invisible stderr.
pub fn init_logging(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "monitor.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes on drop; the writer must outlive every log call.
    std::mem::forget(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("necro_monitor_lib=debug".parse()?),
        )
        .with_writer(non_blocking)
        .with_ansi(false) // log files should not contain ANSI colour codes
        .try_init()
        .map_err(|e| anyhow::anyhow!("Logging init failed: {}", e))?;

    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        tracing::error!("PANIC at {}: {}", location, message);
    }));

    tracing::info!("Necro boss monitor starting, logs in {}", log_dir.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

/// Everything the host keeps after `start`.
pub struct RunningMonitor {
    pub handle:   MonitorHandle,
    /// Overlay and sound events for the host to render / play.
    pub events:   mpsc::Receiver<OverlayEvent>,
    /// Push settings changes here (the config file watcher does the same).
    pub settings: watch::Sender<MonitorConfig>,
}

/// Load settings from `config_dir`, start the config file watcher, and spawn
/// the poll loop with an `OverlaySink` as both presentation and sound.
///
/// Must be called from within a tokio runtime.
pub fn start<R>(reader: R, config_dir: PathBuf) -> Result<RunningMonitor>
where
    R: FrameReader + Send + 'static,
    R::Anchor: Send + 'static,
{
    let cfg = config::load_or_default(&config_dir)?;
    tracing::info!(
        "Settings: refresh={}ms buffer={}s hp<={}% prayer<={}% alerts={}",
        cfg.refresh_interval_ms, cfg.time_buffer_secs,
        cfg.hp_warn_percent, cfg.prayer_warn_percent, cfg.enabled_alerts.len()
    );

    let (settings_tx, settings_rx) = watch::channel(cfg);

    // Plain thread: the watcher blocks on filesystem events and must not hold
    // up runtime shutdown the way a spawn_blocking task would.
    let watcher_tx = settings_tx.clone();
    std::thread::Builder::new()
        .name("config-watcher".to_owned())
        .spawn(move || {
            if let Err(e) = config::run_watcher(config_dir, watcher_tx) {
                tracing::warn!("Config watcher stopped: {}", e);
            }
        })?;

    let (presenter, events) = OverlaySink::channel(OVERLAY_CHANNEL_CAPACITY);
    let sound = OverlaySink::new(presenter.sender());
    let handle = engine::spawn(Monitor::new(reader, presenter, sound), settings_rx);

    Ok(RunningMonitor { handle, events, settings: settings_tx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Always shows a bar with nothing on it.
    struct EmptyBar;

    impl FrameReader for EmptyBar {
        type Frame  = ();
        type Anchor = ();

        fn capture_frame(&mut self) -> Option<()> {
            Some(())
        }
        fn locate_buff_region(&mut self, _frame: &()) -> Option<()> {
            Some(())
        }
        fn read_buffs(&mut self, _frame: &(), _anchor: &()) -> Result<Option<Vec<RawBuffReading>>, ReaderError> {
            Ok(Some(vec![]))
        }
        fn read_vitals(&mut self, _frame: &()) -> Option<VitalSample> {
            None
        }
    }

    #[tokio::test]
    async fn start_wires_reader_to_overlay_events() {
        let dir = tempdir().unwrap();
        let only_ovl = MonitorConfig {
            enabled_alerts: [BuffId::Ovl].into_iter().collect(),
            ..MonitorConfig::default()
        };
        config::save(&only_ovl, dir.path()).unwrap();

        let mut running = start(EmptyBar, dir.path().to_path_buf()).unwrap();

        let mut seen = Vec::new();
        while seen.len() < 4 {
            let next = tokio::time::timeout(std::time::Duration::from_secs(5), running.events.recv())
                .await
                .expect("overlay event in time")
                .expect("channel open");
            seen.push(next);
        }

        assert_eq!(
            seen,
            vec![
                OverlayEvent::Status { text: engine::STATUS_SCANNING.into() },
                OverlayEvent::Status { text: engine::STATUS_READING.into() },
                OverlayEvent::Sound  { cue: SoundCue::Warning },
                OverlayEvent::Border { color: "#c8a030".into() },
            ]
        );

        // Ovl stays missing; only the rising edge was reported.
        tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;
        assert!(running.events.try_recv().is_err());

        running.handle.stop().await;
    }
}
