/// Timed buffs: alert when the buff is about to run out, or is not showing a
/// timer at all.
///
/// A buff that is missing from the timer map is treated as triggered: it is
/// not protecting the player. The buffer boundary is inclusive, so with a
/// 10 s buffer a buff showing exactly 10 s is already flagged.
use super::AlertContext;
use crate::buffs::BuffId;

pub const IDS: &[BuffId] = &[
    BuffId::Ovl,
    BuffId::Prayrenew,
    BuffId::Weapon,
    BuffId::Antifire,
    BuffId::Animdead,
    BuffId::Aura,
    BuffId::Book,
    BuffId::Excal,
    BuffId::Sumrenew,
    BuffId::Darkness,
];

pub fn is_triggered(id: BuffId, ctx: &AlertContext) -> bool {
    match ctx.buffs.time_remaining.get(&id) {
        Some(&remaining) => remaining <= ctx.time_buffer_secs,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{buffs::ClassifiedBuffs, state::VitalReading};

    fn check(remaining: Option<f64>, buffer: f64) -> bool {
        let mut buffs = ClassifiedBuffs::default();
        if let Some(secs) = remaining {
            buffs.present.insert(BuffId::Antifire);
            buffs.time_remaining.insert(BuffId::Antifire, secs);
        }
        let vitals = VitalReading::default();
        let ctx = AlertContext {
            buffs:            &buffs,
            vitals:           &vitals,
            time_buffer_secs: buffer,
            hp_threshold:     0.0,
            prayer_threshold: 0.0,
        };
        is_triggered(BuffId::Antifire, &ctx)
    }

    #[test]
    fn buffer_boundary_is_inclusive() {
        assert!(check(Some(9.0), 10.0));
        assert!(check(Some(10.0), 10.0));
        assert!(!check(Some(11.0), 10.0));
    }

    #[test]
    fn missing_timer_counts_as_expired() {
        assert!(check(None, 10.0));
        assert!(check(None, 0.0));
    }
}
