/// Output seams: presentation (overlay drawing) and sound playback.
///
/// The host owns the actual rendering and audio. The engine only calls the
/// two traits below with semantic parameters. Hosts that would rather
/// receive plain messages (a webview overlay, a test harness) can use
/// `OverlaySink`, which turns every call into an `OverlayEvent` on a bounded
/// tokio channel.
use crate::cues::CueKind;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};

// ---------------------------------------------------------------------------
// Event name constants, for hosts that route by name
// ---------------------------------------------------------------------------
pub const EVENT_STATUS: &str = "monitor:status";
pub const EVENT_BANNER: &str = "monitor:banner";
pub const EVENT_BORDER: &str = "monitor:border";
pub const EVENT_DOTS:   &str = "monitor:dots";
pub const EVENT_SOUND:  &str = "monitor:sound";

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Named sound cues the host knows how to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCue {
    Warning,
    Danger,
    Finger,
    Volley,
}

impl SoundCue {
    pub fn as_str(self) -> &'static str {
        match self {
            SoundCue::Warning => "warning",
            SoundCue::Danger  => "danger",
            SoundCue::Finger  => "finger",
            SoundCue::Volley  => "volley",
        }
    }
}

pub trait Presentation {
    fn set_status_text(&mut self, text: &str);
    fn show_action_banner(&mut self, label: &str, kind: CueKind);
    fn flash_border(&mut self, color_hex: &str);
    fn set_indicator_dots(&mut self, necrosis_stacks: u32, soul_stacks: u32);
}

pub trait Sound {
    fn play_sound(&mut self, cue: SoundCue);
}

// ---------------------------------------------------------------------------
// Payload type (serialised as JSON for webview hosts)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayEvent {
    Status { text: String },
    Banner { label: String, kind: CueKind },
    Border { color: String },
    Dots   { necrosis: u32, souls: u32 },
    Sound  { cue: SoundCue },
}

impl OverlayEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            OverlayEvent::Status { .. } => EVENT_STATUS,
            OverlayEvent::Banner { .. } => EVENT_BANNER,
            OverlayEvent::Border { .. } => EVENT_BORDER,
            OverlayEvent::Dots   { .. } => EVENT_DOTS,
            OverlayEvent::Sound  { .. } => EVENT_SOUND,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| anyhow::anyhow!("Overlay event serialize error: {}", e))
    }
}

// ---------------------------------------------------------------------------
// Channel-backed sink
// ---------------------------------------------------------------------------

/// Implements both collaborator traits by queueing `OverlayEvent`s.
///
/// Sends are non-blocking: if the host falls behind and the channel is full
/// the event is dropped. A closed channel is logged once.
pub struct OverlaySink {
    tx:            Sender<OverlayEvent>,
    closed_logged: bool,
}

impl OverlaySink {
    pub fn new(tx: Sender<OverlayEvent>) -> Self {
        Self { tx, closed_logged: false }
    }

    /// Convenience: a sink plus the receiving end for the host.
    pub fn channel(capacity: usize) -> (Self, Receiver<OverlayEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Another handle onto the same channel, e.g. for a second sink.
    pub fn sender(&self) -> Sender<OverlayEvent> {
        self.tx.clone()
    }

    fn push(&mut self, event: OverlayEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::debug!("Overlay channel full, dropping {}", dropped.event_name());
            }
            Err(TrySendError::Closed(_)) => {
                if !self.closed_logged {
                    tracing::warn!("Overlay channel closed, events are being discarded");
                    self.closed_logged = true;
                }
            }
        }
    }
}

impl Presentation for OverlaySink {
    fn set_status_text(&mut self, text: &str) {
        self.push(OverlayEvent::Status { text: text.to_owned() });
    }

    fn show_action_banner(&mut self, label: &str, kind: CueKind) {
        self.push(OverlayEvent::Banner { label: label.to_owned(), kind });
    }

    fn flash_border(&mut self, color_hex: &str) {
        self.push(OverlayEvent::Border { color: color_hex.to_owned() });
    }

    fn set_indicator_dots(&mut self, necrosis_stacks: u32, soul_stacks: u32) {
        self.push(OverlayEvent::Dots { necrosis: necrosis_stacks, souls: soul_stacks });
    }
}

impl Sound for OverlaySink {
    fn play_sound(&mut self, cue: SoundCue) {
        self.push(OverlayEvent::Sound { cue });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_forwards_calls_in_order() {
        let (mut sink, mut rx) = OverlaySink::channel(8);
        sink.set_status_text("READING BUFFS");
        sink.show_action_banner("FINGER", CueKind::Finger);
        sink.play_sound(SoundCue::Finger);
        sink.set_indicator_dots(6, 2);

        assert_eq!(rx.try_recv().unwrap(), OverlayEvent::Status { text: "READING BUFFS".into() });
        assert_eq!(
            rx.try_recv().unwrap(),
            OverlayEvent::Banner { label: "FINGER".into(), kind: CueKind::Finger }
        );
        assert_eq!(rx.try_recv().unwrap(), OverlayEvent::Sound { cue: SoundCue::Finger });
        assert_eq!(rx.try_recv().unwrap(), OverlayEvent::Dots { necrosis: 6, souls: 2 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_or_closed_channel_does_not_panic() {
        let (mut sink, rx) = OverlaySink::channel(1);
        sink.flash_border("#c8a030");
        sink.flash_border("#e03030"); // dropped, channel full
        drop(rx);
        sink.play_sound(SoundCue::Danger);
        sink.play_sound(SoundCue::Danger);
        assert!(sink.closed_logged);
    }

    #[test]
    fn events_serialise_with_type_tag() {
        let json = OverlayEvent::Banner { label: "VOLLEY".into(), kind: CueKind::Volley }
            .to_json()
            .unwrap();
        assert_eq!(json, r#"{"type":"banner","label":"VOLLEY","kind":"volley"}"#);

        let sound = OverlayEvent::Sound { cue: SoundCue::Warning };
        assert_eq!(sound.event_name(), EVENT_SOUND);
        assert_eq!(sound.to_json().unwrap(), r#"{"type":"sound","cue":"warning"}"#);
        assert_eq!(SoundCue::Warning.as_str(), "warning");
    }
}
