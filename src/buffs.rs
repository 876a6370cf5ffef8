/// Buff taxonomy, label classification, and stack extraction.
///
/// The frame reader hands us whatever text it managed to pull off the buff
/// bar. Labels are noisy: suffixes vary per item tier ("Scriptural Aura",
/// "Mahjarrat Aura") and OCR occasionally clips words. Classification is
/// therefore case-insensitive substring matching against an ordered table.
use crate::reader::RawBuffReading;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

/// Canonical buff identifiers. Serialised as the short lowercase id used in
/// the config file and overlay events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuffId {
    Ovl,
    Prayrenew,
    Weapon,
    Antifire,
    Darkness,
    Quickpray,
    Animdead,
    Souldrain,
    Riteshard,
    Livingdeath,
    Aura,
    Book,
    Familiar,
    Aggro,
    Smokecloud,
    Excal,
    Sumrenew,
    Vuln,
    Lowhp,
    Lowpray,
}

/// How an identifier's alert condition is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertCategory {
    /// Expiring soon, or not on the bar at all.
    Timed,
    /// Not on the bar.
    Presence,
    /// Percentage at or under a threshold.
    Vital,
}

impl BuffId {
    pub const ALL: [BuffId; 20] = [
        BuffId::Ovl,
        BuffId::Prayrenew,
        BuffId::Weapon,
        BuffId::Antifire,
        BuffId::Darkness,
        BuffId::Quickpray,
        BuffId::Animdead,
        BuffId::Souldrain,
        BuffId::Riteshard,
        BuffId::Livingdeath,
        BuffId::Aura,
        BuffId::Book,
        BuffId::Familiar,
        BuffId::Aggro,
        BuffId::Smokecloud,
        BuffId::Excal,
        BuffId::Sumrenew,
        BuffId::Vuln,
        BuffId::Lowhp,
        BuffId::Lowpray,
    ];

    pub fn category(self) -> AlertCategory {
        match self {
            BuffId::Ovl
            | BuffId::Prayrenew
            | BuffId::Weapon
            | BuffId::Antifire
            | BuffId::Animdead
            | BuffId::Aura
            | BuffId::Book
            | BuffId::Excal
            | BuffId::Sumrenew
            | BuffId::Darkness => AlertCategory::Timed,

            BuffId::Quickpray
            | BuffId::Souldrain
            | BuffId::Riteshard
            | BuffId::Livingdeath
            | BuffId::Aggro
            | BuffId::Smokecloud
            | BuffId::Vuln
            | BuffId::Familiar => AlertCategory::Presence,

            BuffId::Lowhp | BuffId::Lowpray => AlertCategory::Vital,
        }
    }

    /// Short id, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            BuffId::Ovl         => "ovl",
            BuffId::Prayrenew   => "prayrenew",
            BuffId::Weapon      => "weapon",
            BuffId::Antifire    => "antifire",
            BuffId::Darkness    => "darkness",
            BuffId::Quickpray   => "quickpray",
            BuffId::Animdead    => "animdead",
            BuffId::Souldrain   => "souldrain",
            BuffId::Riteshard   => "riteshard",
            BuffId::Livingdeath => "livingdeath",
            BuffId::Aura        => "aura",
            BuffId::Book        => "book",
            BuffId::Familiar    => "familiar",
            BuffId::Aggro       => "aggro",
            BuffId::Smokecloud  => "smokecloud",
            BuffId::Excal       => "excal",
            BuffId::Sumrenew    => "sumrenew",
            BuffId::Vuln        => "vuln",
            BuffId::Lowhp       => "lowhp",
            BuffId::Lowpray     => "lowpray",
        }
    }
}

// ---------------------------------------------------------------------------
// Classification table
// ---------------------------------------------------------------------------

/// Ordered (pattern, id) pairs. Patterns are lowercase. The first pattern
/// contained in the lowercased label wins, so keep more specific patterns
/// above the generic ones they overlap with.
pub static CLASSIFICATION_RULES: &[(&str, BuffId)] = &[
    ("overload",         BuffId::Ovl),
    ("prayer renewal",   BuffId::Prayrenew),
    ("weapon poison",    BuffId::Weapon),
    ("antifire",         BuffId::Antifire),
    ("darkness",         BuffId::Darkness),
    ("quick prayers",    BuffId::Quickpray),
    ("quick prayer",     BuffId::Quickpray),
    ("animate dead",     BuffId::Animdead),
    ("soul drain",       BuffId::Souldrain),
    ("ritual shard",     BuffId::Riteshard),
    ("living death",     BuffId::Livingdeath),
    ("scriptural",       BuffId::Aura),
    ("vampyrism",        BuffId::Aura),
    ("mahjarrat",        BuffId::Aura),
    ("berserker",        BuffId::Aura),
    ("maniacal",         BuffId::Aura),
    ("inspiration",      BuffId::Aura),
    ("scripture of ful", BuffId::Book),
    ("scripture of jas", BuffId::Book),
    ("scripture of bik", BuffId::Book),
    ("scripture of wen", BuffId::Book),
    ("book of",          BuffId::Book),
    ("pack yak",         BuffId::Familiar),
    ("nihil",            BuffId::Familiar),
    ("ripper",           BuffId::Familiar),
    ("aggression",       BuffId::Aggro),
    ("smoke cloud",      BuffId::Smokecloud),
    ("excalibur",        BuffId::Excal),
    ("super summoning",  BuffId::Sumrenew),
    ("vulnerability",    BuffId::Vuln),
];

pub fn classify(raw_name: &str) -> Option<BuffId> {
    let lower = raw_name.to_lowercase();
    CLASSIFICATION_RULES
        .iter()
        .find(|(pattern, _)| lower.contains(*pattern))
        .map(|(_, id)| *id)
}

// ---------------------------------------------------------------------------
// Stack extraction
// ---------------------------------------------------------------------------

pub const NECROSIS_BUFF: &str = "necrosis";
pub const SOUL_BUFF:     &str = "residual soul";

pub const MAX_NECROSIS: u32 = 12;
pub const MAX_SOULS:    u32 = 5;

/// Which stack resource, if any, a lowercased label refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackResource {
    Necrosis,
    Souls,
}

pub fn stack_resource(lower_name: &str) -> Option<StackResource> {
    if lower_name.contains(NECROSIS_BUFF) {
        Some(StackResource::Necrosis)
    } else if lower_name.contains(SOUL_BUFF) {
        Some(StackResource::Souls)
    } else {
        None
    }
}

/// First run of ASCII digits in `s`, e.g. "Necrosis (7)" → 7.
fn first_digit_run(s: &str) -> Option<u32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn reading_stacks(reading: &RawBuffReading) -> u32 {
    reading
        .stack_count
        .or_else(|| first_digit_run(&reading.name))
        .unwrap_or(0)
}

/// Scan a tick's readings for the two stack resources.
///
/// Returns `(necrosis, souls)`. A resource with no matching entry is 0; if
/// several entries match, the last one scanned wins.
pub fn extract_stacks(readings: &[RawBuffReading]) -> (u32, u32) {
    let mut necro = 0;
    let mut souls = 0;

    for reading in readings {
        match stack_resource(&reading.name.to_lowercase()) {
            Some(StackResource::Necrosis) => necro = reading_stacks(reading).min(MAX_NECROSIS),
            Some(StackResource::Souls)    => souls = reading_stacks(reading).min(MAX_SOULS),
            None => {}
        }
    }

    (necro, souls)
}

// ---------------------------------------------------------------------------
// Per-tick classification
// ---------------------------------------------------------------------------

/// What one tick's readings say about the taxonomy.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClassifiedBuffs {
    /// Every recognised id visible on the bar.
    pub present:        HashSet<BuffId>,
    /// Seconds left for recognised ids whose icon carried a timer.
    pub time_remaining: HashMap<BuffId, f64>,
}

impl ClassifiedBuffs {
    /// Classify every reading except the stack resources, which are tracked
    /// separately by `extract_stacks`. A later timer for the same id
    /// overwrites an earlier one.
    pub fn from_readings(readings: &[RawBuffReading]) -> Self {
        let mut out = Self::default();
        for reading in readings {
            if reading.name.is_empty() || stack_resource(&reading.name.to_lowercase()).is_some() {
                continue;
            }
            let Some(id) = classify(&reading.name) else {
                continue;
            };
            out.present.insert(id);
            if let Some(secs) = reading.remaining_secs {
                out.time_remaining.insert(id, secs);
            }
        }
        out
    }
}
