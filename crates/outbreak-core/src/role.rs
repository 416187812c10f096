//! The human/zombie state machine.
//!
//! ```text
//!            tag from p, count[p] >= threshold
//!   Human ----------------------------------------> Zombie { p }
//! ```
//!
//! [`handle`] is the whole state machine: it takes the current [`Role`] by
//! mutable reference and one [`GameEvent`], updates the role in place, and
//! returns the side effects the caller must perform. It does no I/O, so
//! every transition can be tested without a radio or a clock.
//!
//! Zombie is terminal. A zombie carries only its broadcast id; the tracker
//! and registry are dropped with the human state at the transition.

use core::time::Duration;

use outbreak_types::{PeerId, RoleKind, TagRecord, ZombificationRecord};
use tracing::{debug, info, trace};

use crate::config::{ConfigError, GameConfig, RulesConfig};
use crate::proximity::ProximityTracker;
use crate::registry::TagRegistry;

/// State held while the device is human.
#[derive(Debug, Clone)]
pub struct HumanState {
    tracker: ProximityTracker,
    registry: TagRegistry,
    started: Duration,
    warning_lit: bool,
}

impl HumanState {
    /// Fresh human state, alive since `started`.
    pub const fn new(rules: RulesConfig, started: Duration) -> Self {
        Self {
            tracker: ProximityTracker::new(rules),
            registry: TagRegistry::new(rules.tag_threshold),
            started,
            warning_lit: false,
        }
    }

    /// The proximity tracker.
    pub const fn tracker(&self) -> &ProximityTracker {
        &self.tracker
    }

    /// The tag registry.
    pub const fn registry(&self) -> &TagRegistry {
        &self.registry
    }
}

/// State held once the device is a zombie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZombieState {
    broadcast_id: PeerId,
}

impl ZombieState {
    /// A zombie broadcasting `broadcast_id`.
    pub const fn new(broadcast_id: PeerId) -> Self {
        Self { broadcast_id }
    }

    /// The id this zombie advertises.
    pub const fn broadcast_id(&self) -> PeerId {
        self.broadcast_id
    }
}

/// The live role of a device.
#[derive(Debug, Clone)]
pub enum Role {
    /// Scanning and counting tags.
    Human(HumanState),
    /// Advertising forever.
    Zombie(ZombieState),
}

impl Role {
    /// Build the starting role from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration does not validate, in
    /// particular for a zombie without a usable peer id.
    pub fn from_config(config: &GameConfig, now: Duration) -> Result<Self, ConfigError> {
        Ok(match config.validate()? {
            Some(broadcast_id) => Self::Zombie(ZombieState::new(broadcast_id)),
            None => Self::Human(HumanState::new(config.game, now)),
        })
    }

    /// Which role this is.
    pub const fn kind(&self) -> RoleKind {
        match self {
            Self::Human(_) => RoleKind::Human,
            Self::Zombie(_) => RoleKind::Zombie,
        }
    }

    /// Broadcast id, if a zombie.
    pub const fn broadcast_id(&self) -> Option<PeerId> {
        match self {
            Self::Human(_) => None,
            Self::Zombie(zombie) => Some(zombie.broadcast_id),
        }
    }

    /// Human state, if human.
    pub const fn as_human(&self) -> Option<&HumanState> {
        match self {
            Self::Human(human) => Some(human),
            Self::Zombie(_) => None,
        }
    }
}

/// Input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent<'a> {
    /// The radio heard an advertisement.
    Observed {
        /// Advertised name.
        name: &'a str,
        /// Signal strength in dBm.
        rssi: i16,
        /// When it was heard.
        now: Duration,
    },
    /// A tick boundary: advance every timer to `now`.
    Elapsed {
        /// Current time.
        now: Duration,
    },
}

/// A side effect requested by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Some zombie came into range.
    IndicatorOn,
    /// No zombie is in range any more.
    IndicatorOff,
    /// Sound the buzzer.
    Beep(Duration),
    /// Overwrite persisted tag counts.
    PersistTags(Vec<TagRecord>),
    /// The device just turned. Release the scanner, start advertising, and
    /// append the record.
    Zombified(ZombificationRecord),
}

/// Apply one event to `role` and return the effects to perform.
///
/// At most one transition happens per call: the first tag event (in
/// ascending peer id order) that reaches the threshold turns the device,
/// and any later tag events from the same tick are discarded.
pub fn handle(role: &mut Role, event: GameEvent<'_>, rules: &RulesConfig) -> Vec<Effect> {
    let Role::Human(human) = role else {
        trace!(?event, "Zombie ignores game event");
        return Vec::new();
    };

    match event {
        GameEvent::Observed { name, rssi, now } => {
            observe(human, name, rssi, now, rules);
            Vec::new()
        }
        GameEvent::Elapsed { now } => {
            let (effects, turned) = elapse(human, now, rules);
            if let Some(broadcast_id) = turned {
                *role = Role::Zombie(ZombieState::new(broadcast_id));
            }
            effects
        }
    }
}

fn observe(human: &mut HumanState, name: &str, rssi: i16, now: Duration, rules: &RulesConfig) {
    let Some(peer_id) = PeerId::from_advertised_name(name, rules.max_peer_id) else {
        trace!(name, rssi, "Dropping advertisement from non-zombie");
        return;
    };
    if human.tracker.on_observation(peer_id, rssi, now) {
        debug!(%peer_id, rssi, "Detected zombie");
    } else {
        trace!(%peer_id, rssi, "Zombie too far away");
    }
}

fn elapse(human: &mut HumanState, now: Duration, rules: &RulesConfig) -> (Vec<Effect>, Option<PeerId>) {
    let mut effects = Vec::new();

    for tag in human.tracker.tick(now) {
        let count = human.registry.register_tag(tag.peer_id);
        info!(peer_id = %tag.peer_id, count, "Tagged by zombie");

        effects.push(Effect::Beep(rules.tag_beep()));
        effects.push(Effect::PersistTags(human.registry.snapshot()));

        if human.registry.threshold_reached(tag.peer_id) {
            let survived = now.saturating_sub(human.started);
            info!(
                peer_id = %tag.peer_id,
                survived_secs = survived.as_secs_f64(),
                "Human has turned into a zombie"
            );
            effects.push(Effect::Zombified(ZombificationRecord {
                broadcast_id: tag.peer_id,
                survived,
            }));
            return (effects, Some(tag.peer_id));
        }
    }

    let lit = human.tracker.any_in_range();
    if lit != human.warning_lit {
        human.warning_lit = lit;
        effects.push(if lit {
            Effect::IndicatorOn
        } else {
            Effect::IndicatorOff
        });
    }

    (effects, None)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn human() -> Role {
        Role::from_config(&GameConfig::default(), Duration::ZERO).unwrap()
    }

    /// One tick: optional sighting, then elapse.
    fn tick(role: &mut Role, name: Option<&str>, t: u64) -> Vec<Effect> {
        let rules = RulesConfig::default();
        let mut effects = Vec::new();
        if let Some(name) = name {
            effects.extend(handle(
                role,
                GameEvent::Observed { name, rssi: -50, now: ms(t) },
                &rules,
            ));
        }
        effects.extend(handle(role, GameEvent::Elapsed { now: ms(t) }, &rules));
        effects
    }

    fn encounter(role: &mut Role, name: &str, from: u64, to: u64) -> Vec<Effect> {
        let mut effects = Vec::new();
        let mut t = from;
        while t <= to {
            effects.extend(tick(role, Some(name), t));
            t += 100;
        }
        effects
    }

    fn gap(role: &mut Role, from: u64, to: u64) -> Vec<Effect> {
        let mut effects = Vec::new();
        let mut t = from;
        while t <= to {
            effects.extend(tick(role, None, t));
            t += 100;
        }
        effects
    }

    #[test]
    fn configured_zombie_starts_as_zombie() {
        let mut config = GameConfig::default();
        config.device.role = RoleKind::Zombie;
        config.device.peer_id = Some(11);
        let role = Role::from_config(&config, Duration::ZERO).unwrap();
        assert_eq!(role.kind(), RoleKind::Zombie);
        assert_eq!(role.broadcast_id().map(PeerId::get), Some(11));
        assert!(role.as_human().is_none());
    }

    #[test]
    fn zombie_without_id_cannot_be_built() {
        let mut config = GameConfig::default();
        config.device.role = RoleKind::Zombie;
        config.device.peer_id = None;
        assert!(Role::from_config(&config, Duration::ZERO).is_err());
    }

    #[test]
    fn indicator_follows_presence() {
        let mut role = human();
        let entered = tick(&mut role, Some("!5"), 0);
        assert_eq!(entered, vec![Effect::IndicatorOn]);

        // Still in range: no repeat.
        assert!(tick(&mut role, Some("!5"), 100).is_empty());

        let left = gap(&mut role, 200, 1200);
        assert_eq!(left, vec![Effect::IndicatorOff]);
    }

    #[test]
    fn tag_beeps_and_persists() {
        let mut role = human();
        let effects = encounter(&mut role, "!5", 0, 3000);
        let peer = PeerId::new(5, 13).unwrap();

        assert_eq!(
            effects,
            vec![
                Effect::IndicatorOn,
                Effect::Beep(ms(500)),
                Effect::PersistTags(vec![TagRecord { peer_id: peer, tag_count: 1 }]),
            ]
        );
        assert_eq!(role.as_human().unwrap().registry().count(peer), 1);
    }

    #[test]
    fn malformed_names_are_ignored() {
        let mut role = human();
        for name in ["5", "!x", "!0", "!14", "?5", ""] {
            assert!(tick(&mut role, Some(name), 0).is_empty());
        }
        assert_eq!(role.as_human().unwrap().tracker().tracked_count(), 0);
    }

    #[test]
    fn third_tag_turns_the_human() {
        let mut role = human();
        encounter(&mut role, "!5", 0, 3000);
        gap(&mut role, 3100, 4500);
        encounter(&mut role, "!5", 4600, 7600);
        gap(&mut role, 7700, 9100);
        let effects = encounter(&mut role, "!5", 9200, 12200);

        assert_eq!(role.kind(), RoleKind::Zombie);
        assert_eq!(role.broadcast_id().map(PeerId::get), Some(5));
        let zombified: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::Zombified(record) => Some(*record),
                _ => None,
            })
            .collect();
        assert_eq!(zombified.len(), 1);
        let record = zombified.first().unwrap();
        assert_eq!(record.broadcast_id.get(), 5);
        assert_eq!(record.survived, ms(12200));
    }

    #[test]
    fn zombie_ignores_everything() {
        let mut config = GameConfig::default();
        config.device.role = RoleKind::Zombie;
        let mut role = Role::from_config(&config, Duration::ZERO).unwrap();

        let effects = encounter(&mut role, "!5", 0, 10_000);
        assert!(effects.is_empty());
        assert_eq!(role.broadcast_id().map(PeerId::get), Some(8));
    }

    #[test]
    fn only_one_transition_when_two_peers_reach_threshold_together() {
        let rules = RulesConfig {
            tag_threshold: 1,
            ..RulesConfig::default()
        };
        let mut role = Role::Human(HumanState::new(rules, Duration::ZERO));
        for name in ["!7", "!3"] {
            handle(&mut role, GameEvent::Observed { name, rssi: -50, now: ms(0) }, &rules);
            handle(&mut role, GameEvent::Observed { name, rssi: -50, now: ms(3000) }, &rules);
        }
        handle(&mut role, GameEvent::Elapsed { now: ms(0) }, &rules);
        let effects = handle(&mut role, GameEvent::Elapsed { now: ms(3000) }, &rules);

        assert_eq!(role.broadcast_id().map(PeerId::get), Some(3));
        let turned = effects
            .iter()
            .filter(|e| matches!(e, Effect::Zombified(_)))
            .count();
        assert_eq!(turned, 1);
        let beeps = effects.iter().filter(|e| matches!(e, Effect::Beep(_))).count();
        assert_eq!(beeps, 1);
    }
}
