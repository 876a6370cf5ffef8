/// Mutable monitor state, owned by the poll loop, passed by reference to
/// each component call.
///
/// All state lives in a single MonitorState owned by the engine task.
/// No locking is needed because only that task mutates it.
use crate::buffs::BuffId;
use crate::reader::VitalSample;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Alert state
// ---------------------------------------------------------------------------

/// Per-identifier "currently triggered" flags. Missing entries are false.
#[derive(Debug, Default)]
pub struct AlertState {
    triggered: HashMap<BuffId, bool>,
}

impl AlertState {
    pub fn is_triggered(&self, id: BuffId) -> bool {
        self.triggered.get(&id).copied().unwrap_or(false)
    }

    /// Store the new flag. Returns true only on a false → true transition.
    pub fn set(&mut self, id: BuffId, now_triggered: bool) -> bool {
        let was = self.triggered.insert(id, now_triggered).unwrap_or(false);
        now_triggered && !was
    }

    pub fn triggered_ids(&self) -> Vec<BuffId> {
        let mut ids: Vec<BuffId> = self
            .triggered
            .iter()
            .filter_map(|(id, on)| on.then_some(*id))
            .collect();
        ids.sort();
        ids
    }

    /// Drop every flag back to false.
    pub fn clear(&mut self) {
        self.triggered.clear();
    }
}

// ---------------------------------------------------------------------------
// Stack counters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackCounters {
    pub necrosis: u32,
    pub souls:    u32,
}

// ---------------------------------------------------------------------------
// Vitals
// ---------------------------------------------------------------------------

/// Last known HP / prayer percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VitalReading {
    pub hp_percent:     f64,
    pub prayer_percent: f64,
}

impl Default for VitalReading {
    fn default() -> Self {
        Self { hp_percent: 100.0, prayer_percent: 100.0 }
    }
}

fn usable_percent(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0).map(|v| v.min(100.0))
}

impl VitalReading {
    /// Fold in a fresh sample. Missing or garbage values keep the old reading.
    pub fn apply(&mut self, sample: &VitalSample) {
        if let Some(hp) = usable_percent(sample.hp_percent) {
            self.hp_percent = hp;
        }
        if let Some(pray) = usable_percent(sample.prayer_percent) {
            self.prayer_percent = pray;
        }
    }
}

// ---------------------------------------------------------------------------
// Anchor
// ---------------------------------------------------------------------------

/// Where the buff bar is on screen, if we know.
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorState<A> {
    Unanchored,
    Anchored(A),
}

impl<A> AnchorState<A> {
    pub fn is_anchored(&self) -> bool {
        matches!(self, AnchorState::Anchored(_))
    }
}

// ---------------------------------------------------------------------------
// Top-level MonitorState
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct MonitorState<A> {
    pub anchor: AnchorState<A>,
    pub alerts: AlertState,
    pub stacks: StackCounters,
    pub vitals: VitalReading,
}

impl<A> MonitorState<A> {
    pub fn new() -> Self {
        Self {
            anchor: AnchorState::Unanchored,
            alerts: AlertState::default(),
            stacks: StackCounters::default(),
            vitals: VitalReading::default(),
        }
    }

    /// Forget the buff bar position. Readings taken without an anchor are
    /// untrustworthy, so every triggered flag goes with it.
    pub fn lose_anchor(&mut self) {
        self.anchor = AnchorState::Unanchored;
        self.alerts.clear();
        tracing::info!("Buff bar anchor lost, alert state cleared");
    }
}

impl<A> Default for MonitorState<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_state_reports_rising_edges_only() {
        let mut alerts = AlertState::default();
        assert!(alerts.set(BuffId::Ovl, true));
        assert!(!alerts.set(BuffId::Ovl, true));
        assert!(!alerts.set(BuffId::Ovl, false));
        assert!(!alerts.is_triggered(BuffId::Ovl));
        assert!(alerts.set(BuffId::Ovl, true));
    }

    #[test]
    fn clear_resets_everything() {
        let mut alerts = AlertState::default();
        alerts.set(BuffId::Aura, true);
        alerts.set(BuffId::Lowhp, true);
        assert_eq!(alerts.triggered_ids(), vec![BuffId::Aura, BuffId::Lowhp]);
        alerts.clear();
        assert!(alerts.triggered_ids().is_empty());
    }

    #[test]
    fn vitals_keep_last_known_value() {
        let mut vitals = VitalReading::default();
        vitals.apply(&VitalSample { hp_percent: Some(42.0), prayer_percent: None });
        assert_eq!(vitals.hp_percent, 42.0);
        assert_eq!(vitals.prayer_percent, 100.0);

        vitals.apply(&VitalSample { hp_percent: Some(-1.0), prayer_percent: Some(f64::NAN) });
        assert_eq!(vitals.hp_percent, 42.0);
        assert_eq!(vitals.prayer_percent, 100.0);

        vitals.apply(&VitalSample { hp_percent: None, prayer_percent: Some(15.0) });
        assert_eq!(vitals, VitalReading { hp_percent: 42.0, prayer_percent: 15.0 });
    }

    #[test]
    fn losing_anchor_clears_alerts() {
        let mut state: MonitorState<u32> = MonitorState::new();
        state.anchor = AnchorState::Anchored(7);
        state.alerts.set(BuffId::Vuln, true);
        state.stacks.necrosis = 6;

        state.lose_anchor();

        assert!(!state.anchor.is_anchored());
        assert!(!state.alerts.is_triggered(BuffId::Vuln));
        assert_eq!(state.stacks.necrosis, 6, "stacks are not part of the anchor reset");
    }
}
