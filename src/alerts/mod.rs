pub mod presence;
pub mod timed;
pub mod vital;

use crate::{
    buffs::{AlertCategory, BuffId, ClassifiedBuffs},
    ipc::SoundCue,
    state::{AlertState, VitalReading},
};
use std::collections::HashSet;

/// Read-only context passed to every category evaluator.
pub struct AlertContext<'a> {
    pub buffs:            &'a ClassifiedBuffs,
    pub vitals:           &'a VitalReading,
    /// Timed buffs at or under this many seconds count as expiring.
    pub time_buffer_secs: f64,
    pub hp_threshold:     f64,
    pub prayer_threshold: f64,
}

/// Evaluation order: timed, then presence, then vitals.
fn evaluation_order() -> impl Iterator<Item = BuffId> {
    timed::IDS
        .iter()
        .chain(presence::IDS)
        .chain(vital::IDS)
        .copied()
}

/// Run every enabled identifier through its category rule and update
/// `alerts`. Returns the identifiers that went false → true this tick.
///
/// Disabled identifiers are skipped outright: their stored flag is left as
/// it was and they never produce an edge.
pub fn evaluate(
    alerts:  &mut AlertState,
    ctx:     &AlertContext,
    enabled: &HashSet<BuffId>,
) -> Vec<BuffId> {
    let mut newly_triggered = Vec::new();

    for id in evaluation_order() {
        if !enabled.contains(&id) {
            continue;
        }

        let now_triggered = match id.category() {
            AlertCategory::Timed    => timed::is_triggered(id, ctx),
            AlertCategory::Presence => presence::is_triggered(id, ctx),
            AlertCategory::Vital    => vital::is_triggered(id, ctx),
        };

        if alerts.set(id, now_triggered) {
            tracing::debug!("Alert raised: {}", id.as_str());
            newly_triggered.push(id);
        }
    }

    newly_triggered
}

// ---------------------------------------------------------------------------
// Side effects for a freshly raised alert
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertEffect {
    pub sound:  SoundCue,
    pub border: &'static str,
}

pub fn effect_for(id: BuffId) -> AlertEffect {
    match id {
        BuffId::Lowhp   => AlertEffect { sound: SoundCue::Danger,  border: "#e03030" },
        BuffId::Lowpray => AlertEffect { sound: SoundCue::Warning, border: "#8040c0" },
        _               => AlertEffect { sound: SoundCue::Warning, border: "#c8a030" },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_enabled() -> HashSet<BuffId> {
        BuffId::ALL.into_iter().collect()
    }

    fn healthy() -> VitalReading {
        VitalReading { hp_percent: 90.0, prayer_percent: 90.0 }
    }

    /// Every timed buff with plenty of time, every presence buff on the bar.
    fn fully_buffed() -> ClassifiedBuffs {
        let mut buffs = ClassifiedBuffs::default();
        for id in timed::IDS {
            buffs.present.insert(*id);
            buffs.time_remaining.insert(*id, 300.0);
        }
        for id in presence::IDS {
            buffs.present.insert(*id);
        }
        buffs
    }

    fn ctx<'a>(buffs: &'a ClassifiedBuffs, vitals: &'a VitalReading) -> AlertContext<'a> {
        AlertContext {
            buffs,
            vitals,
            time_buffer_secs: 10.0,
            hp_threshold:     30.0,
            prayer_threshold: 20.0,
        }
    }

    #[test]
    fn id_lists_match_categories() {
        for id in timed::IDS {
            assert_eq!(id.category(), AlertCategory::Timed);
        }
        for id in presence::IDS {
            assert_eq!(id.category(), AlertCategory::Presence);
        }
        for id in vital::IDS {
            assert_eq!(id.category(), AlertCategory::Vital);
        }
        assert_eq!(evaluation_order().count(), BuffId::ALL.len());
    }

    #[test]
    fn fully_buffed_raises_nothing() {
        let mut alerts = AlertState::default();
        let buffs = fully_buffed();
        let vitals = healthy();
        assert!(evaluate(&mut alerts, &ctx(&buffs, &vitals), &all_enabled()).is_empty());
    }

    #[test]
    fn empty_bar_raises_every_buff_once() {
        let mut alerts = AlertState::default();
        let buffs = ClassifiedBuffs::default();
        let vitals = healthy();
        let enabled = all_enabled();

        let first = evaluate(&mut alerts, &ctx(&buffs, &vitals), &enabled);
        assert_eq!(first.len(), timed::IDS.len() + presence::IDS.len());
        assert_eq!(first[0], BuffId::Ovl);

        // Still missing on the next ticks, but nothing new fires.
        for _ in 0..3 {
            assert!(evaluate(&mut alerts, &ctx(&buffs, &vitals), &enabled).is_empty());
        }
    }

    #[test]
    fn recovery_is_silent_and_rearms() {
        let mut alerts = AlertState::default();
        let enabled = all_enabled();
        let vitals = healthy();
        let mut buffs = fully_buffed();
        buffs.present.remove(&BuffId::Souldrain);

        assert_eq!(evaluate(&mut alerts, &ctx(&buffs, &vitals), &enabled), vec![BuffId::Souldrain]);

        buffs.present.insert(BuffId::Souldrain);
        assert!(evaluate(&mut alerts, &ctx(&buffs, &vitals), &enabled).is_empty());
        assert!(!alerts.is_triggered(BuffId::Souldrain));

        buffs.present.remove(&BuffId::Souldrain);
        assert_eq!(evaluate(&mut alerts, &ctx(&buffs, &vitals), &enabled), vec![BuffId::Souldrain]);
    }

    #[test]
    fn disabled_ids_keep_their_flag() {
        let mut alerts = AlertState::default();
        alerts.set(BuffId::Ovl, true);
        let mut enabled = all_enabled();
        enabled.remove(&BuffId::Ovl);
        enabled.remove(&BuffId::Aggro);

        let buffs = ClassifiedBuffs::default();
        let vitals = healthy();
        let raised = evaluate(&mut alerts, &ctx(&buffs, &vitals), &enabled);

        assert!(!raised.contains(&BuffId::Ovl));
        assert!(!raised.contains(&BuffId::Aggro));
        assert!(alerts.is_triggered(BuffId::Ovl), "disabled flag must be left untouched");
        assert!(!alerts.is_triggered(BuffId::Aggro));
    }

    #[test]
    fn vital_thresholds_fire_on_edges() {
        let mut alerts = AlertState::default();
        let buffs = fully_buffed();
        let enabled = all_enabled();

        let low = VitalReading { hp_percent: 30.0, prayer_percent: 10.0 };
        assert_eq!(
            evaluate(&mut alerts, &ctx(&buffs, &low), &enabled),
            vec![BuffId::Lowhp, BuffId::Lowpray]
        );
        assert!(evaluate(&mut alerts, &ctx(&buffs, &low), &enabled).is_empty());

        let ok = VitalReading { hp_percent: 31.0, prayer_percent: 10.0 };
        assert!(evaluate(&mut alerts, &ctx(&buffs, &ok), &enabled).is_empty());
        assert!(!alerts.is_triggered(BuffId::Lowhp));
        assert!(alerts.is_triggered(BuffId::Lowpray));
    }

    #[test]
    fn effects_match_alert_kind() {
        assert_eq!(effect_for(BuffId::Lowhp).sound, SoundCue::Danger);
        assert_eq!(effect_for(BuffId::Lowpray).border, "#8040c0");
        assert_eq!(effect_for(BuffId::Book), AlertEffect { sound: SoundCue::Warning, border: "#c8a030" });
    }
}
