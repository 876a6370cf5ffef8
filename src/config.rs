/// Monitor settings, persisted as TOML in a host-chosen config directory.
///
/// The host decides where `config.toml` lives (usually next to its own
/// settings). Every field has a serde default so a partial or empty file is
/// valid, and a missing file yields `MonitorConfig::default()`.
///
/// Live reload: `run_watcher` watches the directory and publishes each new
/// value on a `tokio::sync::watch` channel. The poll loop picks up interval
/// changes from that channel without restarting.
use crate::buffs::BuffId;
use anyhow::Result;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use tokio::sync::watch;

pub const CONFIG_FILE: &str = "config.toml";

// ---------------------------------------------------------------------------
// MonitorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Poll cadence in milliseconds.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Timed buffs at or under this many seconds are flagged as expiring.
    #[serde(default = "default_time_buffer_secs")]
    pub time_buffer_secs: f64,

    /// Low HP alert at or under this percentage.
    #[serde(default = "default_hp_warn_percent")]
    pub hp_warn_percent: f64,

    /// Low prayer alert at or under this percentage.
    #[serde(default = "default_prayer_warn_percent")]
    pub prayer_warn_percent: f64,

    /// Identifiers whose alerts are switched on. Anything not listed is
    /// skipped by the alert state machine.
    #[serde(default = "default_enabled_alerts")]
    pub enabled_alerts: HashSet<BuffId>,

    /// Log every raw buff reading and show the buff count in the status line.
    #[serde(default)]
    pub debug_logging: bool,

    /// Master switch for buff and vital alerts. Stack cues ignore it.
    #[serde(default = "default_alerts_enabled")]
    pub alerts_enabled: bool,
}

fn default_refresh_interval_ms() -> u64 { 600 }
fn default_time_buffer_secs() -> f64 { 10.0 }
fn default_hp_warn_percent() -> f64 { 30.0 }
fn default_prayer_warn_percent() -> f64 { 20.0 }
fn default_enabled_alerts() -> HashSet<BuffId> { BuffId::ALL.into_iter().collect() }
fn default_alerts_enabled() -> bool { true }

/// Floor for the poll interval; anything faster just burns CPU on capture.
pub const MIN_REFRESH_INTERVAL_MS: u64 = 50;

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            time_buffer_secs:    default_time_buffer_secs(),
            hp_warn_percent:     default_hp_warn_percent(),
            prayer_warn_percent: default_prayer_warn_percent(),
            enabled_alerts:      default_enabled_alerts(),
            debug_logging:       false,
            alerts_enabled:      default_alerts_enabled(),
        }
    }
}

impl MonitorConfig {
    pub fn is_enabled(&self, id: BuffId) -> bool {
        self.enabled_alerts.contains(&id)
    }

    /// Refresh interval with the floor applied.
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.refresh_interval_ms.max(MIN_REFRESH_INTERVAL_MS))
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

pub fn load_or_default(config_dir: &Path) -> Result<MonitorConfig> {
    let path = config_dir.join(CONFIG_FILE);
    if path.exists() {
        let raw = std::fs::read_to_string(&path)?;
        let cfg: MonitorConfig = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Config parse error: {}", e))?;
        Ok(cfg)
    } else {
        Ok(MonitorConfig::default())
    }
}

pub fn save(config: &MonitorConfig, config_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(config_dir)?;
    let raw = toml::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("Config serialize error: {}", e))?;
    std::fs::write(config_dir.join(CONFIG_FILE), raw)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Live reload
// ---------------------------------------------------------------------------

/// Re-read the config and publish it if it differs from the current value.
/// A file that fails to parse keeps the previous settings.
///
/// Returns true if a new value was published.
pub fn reload_into(config_dir: &Path, tx: &watch::Sender<MonitorConfig>) -> bool {
    match load_or_default(config_dir) {
        Ok(cfg) => tx.send_if_modified(|current| {
            if *current == cfg {
                return false;
            }
            tracing::info!(
                "Config reloaded: refresh={}ms buffer={}s hp<={}% prayer<={}%",
                cfg.refresh_interval_ms, cfg.time_buffer_secs,
                cfg.hp_warn_percent, cfg.prayer_warn_percent
            );
            *current = cfg;
            true
        }),
        Err(e) => {
            tracing::warn!("Keeping previous config: {}", e);
            false
        }
    }
}

/// Blocking watcher loop; give it a thread of its own.
///
/// Watches the config directory (more reliable than watching the file, since
/// editors often replace it) and reloads on any create/modify touching
/// `config.toml`. Exits when every receiver of `tx` is gone.
pub fn run_watcher(config_dir: PathBuf, tx: watch::Sender<MonitorConfig>) -> Result<()> {
    tracing::info!("Config watcher starting: {:?}", config_dir);
    std::fs::create_dir_all(&config_dir)?;

    let config_path = config_dir.join(CONFIG_FILE);
    let (fs_tx, fs_rx) = std_mpsc::channel::<notify::Result<Event>>();
    let mut watcher = RecommendedWatcher::new(fs_tx, notify::Config::default())?;
    watcher.watch(&config_dir, RecursiveMode::NonRecursive)?;

    loop {
        match fs_rx.recv() {
            Ok(Ok(Event { kind: EventKind::Modify(_) | EventKind::Create(_), paths, .. })) => {
                if paths.iter().any(|p| p == &config_path) {
                    reload_into(&config_dir, &tx);
                }
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!("Config watcher error: {}", e),
            Err(_) => {
                tracing::warn!("Config watcher channel closed, exiting");
                break;
            }
        }
        if tx.is_closed() {
            tracing::debug!("No config subscribers left, watcher exiting");
            break;
        }
    }
    Ok(())
}
