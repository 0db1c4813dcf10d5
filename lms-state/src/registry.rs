//! Player registry and discovery barrier
//!
//! The registry owns every `Player`, keyed by hardware address, and keeps
//! insertion order so dispatch walks players deterministically.
//!
//! The barrier is counted: once `player count <n>` arms it with `n`, the
//! registration that brings the registry to `n` players reports
//! `barrier_reached`. That happens at most once for the registry's lifetime.

use std::collections::HashMap;

use lms_protocol::PlayerId;

use crate::model::Player;

/// Whether `register` created a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    New,
    Existing,
}

/// Result of a `register` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterOutcome {
    pub registration: Registration,
    /// True only for the call that completed discovery
    pub barrier_reached: bool,
}

/// Mapping from player address to player state
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    /// Players in registration order
    players: Vec<Player>,
    index: HashMap<PlayerId, usize>,
    expected: Option<usize>,
    barrier_fired: bool,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all players and expect `expected` registrations
    ///
    /// Returns true if this completes discovery on its own (`expected == 0`).
    pub fn reset(&mut self, expected: usize) -> bool {
        self.players.clear();
        self.index.clear();
        self.expected = Some(expected);
        self.check_barrier()
    }

    /// Register a player; a known address is left untouched
    pub fn register(&mut self, index: usize, id: PlayerId) -> RegisterOutcome {
        if self.index.contains_key(&id) {
            return RegisterOutcome {
                registration: Registration::Existing,
                barrier_reached: false,
            };
        }

        self.index.insert(id.clone(), self.players.len());
        self.players.push(Player::new(id, index));

        RegisterOutcome {
            registration: Registration::New,
            barrier_reached: self.check_barrier(),
        }
    }

    fn check_barrier(&mut self) -> bool {
        if self.barrier_fired || self.expected != Some(self.players.len()) {
            return false;
        }
        self.barrier_fired = true;
        true
    }

    /// Count announced by the server, if any
    pub fn expected(&self) -> Option<usize> {
        self.expected
    }

    /// Whether the barrier has fired
    pub fn is_complete(&self) -> bool {
        self.barrier_fired
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.index.get(id).map(|&slot| &self.players[slot])
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        let slot = *self.index.get(id)?;
        self.players.get_mut(slot)
    }

    /// Player addresses in registration order
    pub fn ids(&self) -> impl Iterator<Item = &PlayerId> + '_ {
        self.players.iter().map(Player::id)
    }

    /// Players in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Player> + '_ {
        self.players.iter()
    }

    /// Players in registration order, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> + '_ {
        self.players.iter_mut()
    }

    /// First player whose reported name equals `name`
    pub fn find_by_name(&self, name: &str) -> Option<&Player> {
        self.iter().find(|p| p.name() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayerProperty;

    fn id(n: u8) -> PlayerId {
        PlayerId::new(format!("00:00:00:00:00:{:02x}", n))
    }

    #[test]
    fn test_barrier_fires_once_when_count_met() {
        let mut registry = PlayerRegistry::new();
        assert!(!registry.reset(2));

        let first = registry.register(0, id(1));
        assert_eq!(first.registration, Registration::New);
        assert!(!first.barrier_reached);

        let second = registry.register(1, id(2));
        assert!(second.barrier_reached);
        assert!(registry.is_complete());
    }

    #[test]
    fn test_duplicate_registration_is_a_noop() {
        let mut registry = PlayerRegistry::new();
        registry.reset(1);
        assert!(registry.register(0, id(1)).barrier_reached);

        registry
            .get_mut(&id(1))
            .unwrap()
            .set_property(PlayerProperty::Volume(42));

        let again = registry.register(5, id(1));
        assert_eq!(again.registration, Registration::Existing);
        assert!(!again.barrier_reached);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id(1)).unwrap().volume(), 42);
        assert_eq!(registry.get(&id(1)).unwrap().index(), 0);
    }

    #[test]
    fn test_later_registrations_do_not_refire() {
        let mut registry = PlayerRegistry::new();
        registry.reset(1);
        assert!(registry.register(0, id(1)).barrier_reached);
        assert!(!registry.register(1, id(2)).barrier_reached);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_zero_expected_completes_on_reset() {
        let mut registry = PlayerRegistry::new();
        assert!(registry.reset(0));
        assert!(registry.is_complete());
    }

    #[test]
    fn test_barrier_not_armed_without_count() {
        let mut registry = PlayerRegistry::new();
        assert!(!registry.register(0, id(1)).barrier_reached);
        assert_eq!(registry.expected(), None);
    }

    #[test]
    fn test_reset_clears_players() {
        let mut registry = PlayerRegistry::new();
        registry.reset(3);
        registry.register(0, id(1));
        registry.reset(2);
        assert!(registry.is_empty());
        assert!(!registry.contains(&id(1)));
        assert!(registry.get(&id(1)).is_none());
        assert_eq!(registry.expected(), Some(2));
    }

    #[test]
    fn test_iteration_follows_registration_order() {
        let mut registry = PlayerRegistry::new();
        registry.reset(3);
        registry.register(2, id(9));
        registry.register(0, id(3));
        registry.register(1, id(5));

        let order: Vec<_> = registry.iter().map(|p| p.id().clone()).collect();
        assert_eq!(order, vec![id(9), id(3), id(5)]);
        assert_eq!(registry.ids().cloned().collect::<Vec<_>>(), vec![id(9), id(3), id(5)]);
        assert_eq!(registry.get(&id(3)).map(|p| p.index()), Some(0));
    }

    #[test]
    fn test_find_by_name() {
        let mut registry = PlayerRegistry::new();
        registry.register(0, id(1));
        registry
            .get_mut(&id(1))
            .unwrap()
            .set_property(PlayerProperty::Name("Kitchen".to_string()));

        assert_eq!(registry.find_by_name("Kitchen").map(|p| p.id()), Some(&id(1)));
        assert!(registry.find_by_name("Hall").is_none());
    }
}
