/// Presence buffs: alert whenever the buff is not on the bar. No timing.
use super::AlertContext;
use crate::buffs::BuffId;

pub const IDS: &[BuffId] = &[
    BuffId::Quickpray,
    BuffId::Souldrain,
    BuffId::Riteshard,
    BuffId::Livingdeath,
    BuffId::Aggro,
    BuffId::Smokecloud,
    BuffId::Vuln,
    BuffId::Familiar,
];

pub fn is_triggered(id: BuffId, ctx: &AlertContext) -> bool {
    !ctx.buffs.present.contains(&id)
}
