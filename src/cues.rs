/// Action cues: one-shot prompts tied to stack counters reaching milestones.
///
/// FINGER fires when necrosis stacks change to exactly 6 or 12.
/// VOLLEY fires when residual souls rise to 5.
///
/// OCR can flicker the same value across adjacent ticks, so each cue kind has
/// its own debounce window. A crossing that lands inside the window is
/// dropped and does NOT restart the window.
use crate::ipc::SoundCue;
use serde::{Deserialize, Serialize};

pub const CUE_DEBOUNCE_MS: u64 = 2_500;

const FINGER_NECROSIS: [u32; 2] = [6, 12];
const VOLLEY_SOULS:    u32      = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    Finger,
    Volley,
}

impl CueKind {
    /// Banner text shown on the overlay.
    pub fn label(self) -> &'static str {
        match self {
            CueKind::Finger => "FINGER",
            CueKind::Volley => "VOLLEY",
        }
    }

    pub fn sound(self) -> SoundCue {
        match self {
            CueKind::Finger => SoundCue::Finger,
            CueKind::Volley => SoundCue::Volley,
        }
    }

    pub fn border(self) -> &'static str {
        match self {
            CueKind::Finger => "#c040ff",
            CueKind::Volley => "#40d0ff",
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CueDispatcher {
    last_finger_ms: Option<u64>,
    last_volley_ms: Option<u64>,
}

fn can_fire(last_ms: Option<u64>, now_ms: u64) -> bool {
    match last_ms {
        Some(last) => now_ms.saturating_sub(last) > CUE_DEBOUNCE_MS,
        None => true,
    }
}

impl CueDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare this tick's stacks against the previous tick's and return the
    /// cues to fire, FINGER before VOLLEY.
    pub fn check_stack_cues(
        &mut self,
        prev_necro: u32,
        prev_souls: u32,
        new_necro:  u32,
        new_souls:  u32,
        now_ms:     u64,
    ) -> Vec<CueKind> {
        let mut cues = Vec::new();

        if FINGER_NECROSIS.contains(&new_necro) && new_necro != prev_necro {
            if can_fire(self.last_finger_ms, now_ms) {
                self.last_finger_ms = Some(now_ms);
                cues.push(CueKind::Finger);
            } else {
                tracing::debug!("FINGER suppressed at {} necrosis (debounce)", new_necro);
            }
        }

        if new_souls == VOLLEY_SOULS && prev_souls < VOLLEY_SOULS {
            if can_fire(self.last_volley_ms, now_ms) {
                self.last_volley_ms = Some(now_ms);
                cues.push(CueKind::Volley);
            } else {
                tracing::debug!("VOLLEY suppressed (debounce)");
            }
        }

        cues
    }
}
