/// Poll loop: the "brain" of the monitor.
///
/// One tick per refresh interval: capture a frame, (re)locate the buff bar if
/// needed, read buffs and vitals, classify, update alert and stack state, and
/// forward whatever changed to the presentation and sound collaborators.
///
/// Anchor state machine:
///   Unanchored --locate ok--> Anchored --read fault--> Unanchored
///
/// A read fault clears every alert flag. Without a trustworthy anchor the
/// old flags say nothing about the current screen, and leaving them set would
/// swallow the next rising edge after re-anchoring.
use crate::{
    alerts::{self, AlertContext},
    buffs::{self, BuffId, ClassifiedBuffs},
    config::MonitorConfig,
    cues::{CueDispatcher, CueKind},
    ipc::{Presentation, Sound},
    reader::{FrameReader, RawBuffReading},
    state::{AnchorState, MonitorState, StackCounters},
};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

pub const STATUS_SCANNING:  &str = "SCANNING...";
pub const STATUS_NOT_FOUND: &str = "BUFF BAR NOT FOUND - focus RS3";
pub const STATUS_READING:   &str = "READING BUFFS";

// ---------------------------------------------------------------------------
// Tick outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Capture failed; nothing changed.
    NoFrame,
    /// Buff bar could not be located; still unanchored.
    BuffBarNotFound,
    /// Anchored read produced no usable data this frame.
    NoData,
    /// Anchored read faulted; anchor dropped and alerts cleared.
    AnchorLost,
    /// Full pass completed.
    Read {
        newly_triggered: Vec<BuffId>,
        cues:            Vec<CueKind>,
    },
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

pub struct Monitor<R: FrameReader, P, S> {
    reader:      R,
    presenter:   P,
    sound:       S,
    state:       MonitorState<R::Anchor>,
    cues:        CueDispatcher,
    last_status: Option<String>,
}

impl<R, P, S> Monitor<R, P, S>
where
    R: FrameReader,
    P: Presentation,
    S: Sound,
{
    pub fn new(reader: R, presenter: P, sound: S) -> Self {
        Self {
            reader,
            presenter,
            sound,
            state:       MonitorState::new(),
            cues:        CueDispatcher::new(),
            last_status: None,
        }
    }

    pub fn state(&self) -> &MonitorState<R::Anchor> {
        &self.state
    }

    /// Status text is only pushed when it changes so an unanchored loop does
    /// not spam the overlay every tick.
    fn set_status(&mut self, text: &str) {
        if self.last_status.as_deref() == Some(text) {
            return;
        }
        self.presenter.set_status_text(text);
        self.last_status = Some(text.to_owned());
    }

    /// Run one tick. `now_ms` is a monotonic millisecond clock used for cue
    /// debouncing.
    pub fn tick(&mut self, cfg: &MonitorConfig, now_ms: u64) -> TickOutcome {
        let Some(frame) = self.reader.capture_frame() else {
            return TickOutcome::NoFrame;
        };

        // Vitals do not depend on the buff bar anchor.
        if let Some(sample) = self.reader.read_vitals(&frame) {
            self.state.vitals.apply(&sample);
        }

        if !self.state.anchor.is_anchored() {
            match self.reader.locate_buff_region(&frame) {
                Some(anchor) => {
                    tracing::info!("Buff bar located");
                    self.state.anchor = AnchorState::Anchored(anchor);
                    self.set_status(STATUS_READING);
                }
                None => {
                    self.set_status(STATUS_NOT_FOUND);
                    return TickOutcome::BuffBarNotFound;
                }
            }
        }

        let read = match &self.state.anchor {
            AnchorState::Anchored(anchor) => self.reader.read_buffs(&frame, anchor),
            AnchorState::Unanchored => return TickOutcome::BuffBarNotFound,
        };

        match read {
            Ok(Some(readings)) => self.process_readings(cfg, &readings, now_ms),
            Ok(None) => TickOutcome::NoData,
            Err(e) => {
                tracing::warn!("Buff read fault, re-anchoring: {}", e);
                self.state.lose_anchor();
                self.set_status(STATUS_NOT_FOUND);
                TickOutcome::AnchorLost
            }
        }
    }

    fn process_readings(
        &mut self,
        cfg:      &MonitorConfig,
        readings: &[RawBuffReading],
        now_ms:   u64,
    ) -> TickOutcome {
        if cfg.debug_logging {
            let names: Vec<String> = readings
                .iter()
                .map(|b| format!("{} t={:?} stacks={:?}", b.name, b.remaining_secs, b.stack_count))
                .collect();
            tracing::info!("Buffs: {:?}", names);
            self.set_status(&format!("{} buffs found", readings.len()));
        }

        let classified = ClassifiedBuffs::from_readings(readings);
        let (necrosis, souls) = buffs::extract_stacks(readings);

        // --- Stacks and action cues ---
        let prev = self.state.stacks;
        let next = StackCounters { necrosis, souls };
        self.state.stacks = next;

        let mut cues = Vec::new();
        if next != prev {
            self.presenter.set_indicator_dots(next.necrosis, next.souls);
            cues = self.cues.check_stack_cues(prev.necrosis, prev.souls, next.necrosis, next.souls, now_ms);
            for cue in &cues {
                tracing::info!("Action cue: {}", cue.label());
                self.presenter.show_action_banner(cue.label(), *cue);
                self.sound.play_sound(cue.sound());
                self.presenter.flash_border(cue.border());
            }
        }

        // --- Buff and vital alerts ---
        let mut newly_triggered = Vec::new();
        if cfg.alerts_enabled {
            let ctx = AlertContext {
                buffs:            &classified,
                vitals:           &self.state.vitals,
                time_buffer_secs: cfg.time_buffer_secs,
                hp_threshold:     cfg.hp_warn_percent,
                prayer_threshold: cfg.prayer_warn_percent,
            };
            newly_triggered = alerts::evaluate(&mut self.state.alerts, &ctx, &cfg.enabled_alerts);

            for id in &newly_triggered {
                let effect = alerts::effect_for(*id);
                tracing::debug!("Alert {} -> sound={} border={}", id.as_str(), effect.sound.as_str(), effect.border);
                self.sound.play_sound(effect.sound);
                self.presenter.flash_border(effect.border);
            }
        }

        TickOutcome::Read { newly_triggered, cues }
    }
}

// ---------------------------------------------------------------------------
// Periodic task
// ---------------------------------------------------------------------------

fn new_ticker(period: std::time::Duration) -> Interval {
    let mut ticker = time::interval(period);
    // A slow tick delays the next one instead of bunching catch-up ticks.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Drive `monitor` until `shutdown` fires (or its sender is dropped).
///
/// Settings are re-read whenever `settings` changes. A new refresh interval
/// replaces the running ticker; the old one is dropped, never left running
/// alongside.
pub async fn run<R, P, S>(
    mut monitor:  Monitor<R, P, S>,
    mut settings: watch::Receiver<MonitorConfig>,
    mut shutdown: oneshot::Receiver<()>,
) where
    R: FrameReader,
    P: Presentation,
    S: Sound,
{
    let mut cfg = settings.borrow_and_update().clone();
    let mut ticker = new_ticker(cfg.refresh_interval());
    let mut settings_open = true;
    let started = Instant::now();

    tracing::info!("Monitor loop starting: refresh={}ms", cfg.refresh_interval().as_millis());
    monitor.set_status(STATUS_SCANNING);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now_ms = started.elapsed().as_millis() as u64;
                let outcome = monitor.tick(&cfg, now_ms);
                tracing::trace!("tick @{}ms: {:?}", now_ms, outcome);
            }

            changed = settings.changed(), if settings_open => {
                if changed.is_err() {
                    tracing::info!("Settings source closed, keeping last config");
                    settings_open = false;
                    continue;
                }
                let next = settings.borrow_and_update().clone();
                if next.refresh_interval() != cfg.refresh_interval() {
                    tracing::info!(
                        "Refresh interval {}ms -> {}ms",
                        cfg.refresh_interval().as_millis(),
                        next.refresh_interval().as_millis()
                    );
                    ticker = new_ticker(next.refresh_interval());
                }
                cfg = next;
            }

            _ = &mut shutdown => break,
        }
    }

    tracing::info!("Monitor loop stopped");
}

/// Handle to a spawned monitor loop. Dropping it also stops the loop.
pub struct MonitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task:     JoinHandle<()>,
}

impl MonitorHandle {
    /// Signal the loop to stop and wait for it to finish its current tick.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!("Monitor task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the poll loop on the current tokio runtime.
pub fn spawn<R, P, S>(monitor: Monitor<R, P, S>, settings: watch::Receiver<MonitorConfig>) -> MonitorHandle
where
    R: FrameReader + Send + 'static,
    R::Anchor: Send + 'static,
    P: Presentation + Send + 'static,
    S: Sound + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let task = tokio::spawn(run(monitor, settings, rx));
    MonitorHandle { shutdown: Some(tx), task }
}
