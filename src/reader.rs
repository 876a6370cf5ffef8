/// Frame reader seam. Screen capture and optical extraction live in the host.
///
/// The host captures the game window, finds the buff bar, and OCRs it. All we
/// need is the resulting text and numbers. `None` from any method means "no
/// new information this tick" and must never be read as zero.
use thiserror::Error;

/// One buff icon as read off the bar this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBuffReading {
    pub name:           String,
    /// Seconds left on the icon's timer, if the icon shows one.
    pub remaining_secs: Option<f64>,
    /// Explicit stack number rendered on the icon, if any.
    pub stack_count:    Option<u32>,
}

impl RawBuffReading {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), remaining_secs: None, stack_count: None }
    }

    pub fn timed(name: impl Into<String>, remaining_secs: f64) -> Self {
        Self { remaining_secs: Some(remaining_secs), ..Self::new(name) }
    }

    pub fn stacked(name: impl Into<String>, stack_count: u32) -> Self {
        Self { stack_count: Some(stack_count), ..Self::new(name) }
    }
}

/// HP / prayer orb readings. Either side may be missing on a given frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VitalSample {
    pub hp_percent:     Option<f64>,
    pub prayer_percent: Option<f64>,
}

/// Faults raised while reading an anchored buff bar. Any of these means the
/// anchor can no longer be trusted.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("buff bar layout changed")]
    LayoutChanged,
    #[error("buff read failed: {0}")]
    Read(String),
}

pub trait FrameReader {
    type Frame;
    type Anchor;

    /// Grab the current game frame. `None` = capture unavailable this tick.
    fn capture_frame(&mut self) -> Option<Self::Frame>;

    /// Find the buff bar inside a frame.
    fn locate_buff_region(&mut self, frame: &Self::Frame) -> Option<Self::Anchor>;

    /// Read buffs at a previously located anchor. `Ok(None)` = nothing usable
    /// this frame; `Err` = the anchor is stale.
    fn read_buffs(
        &mut self,
        frame:  &Self::Frame,
        anchor: &Self::Anchor,
    ) -> Result<Option<Vec<RawBuffReading>>, ReaderError>;

    /// Read the HP and prayer orbs. Independent of the buff bar anchor.
    fn read_vitals(&mut self, frame: &Self::Frame) -> Option<VitalSample>;
}
