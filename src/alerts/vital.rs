/// Vital pseudo-buffs: HP and prayer at or under the configured percentage.
use super::AlertContext;
use crate::buffs::BuffId;

pub const IDS: &[BuffId] = &[BuffId::Lowhp, BuffId::Lowpray];

pub fn is_triggered(id: BuffId, ctx: &AlertContext) -> bool {
    match id {
        BuffId::Lowhp   => ctx.vitals.hp_percent <= ctx.hp_threshold,
        BuffId::Lowpray => ctx.vitals.prayer_percent <= ctx.prayer_threshold,
        _ => false,
    }
}
