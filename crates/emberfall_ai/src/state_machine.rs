//! Guarded finite state machine
//!
//! Each state owns a list of guarded edges. An update first checks the global
//! edges (reachable from any other state), then the current state's edges,
//! highest priority first, and follows the first guard that holds. At most
//! one edge fires per update.

use std::collections::HashMap;
use std::hash::Hash;

/// A state the machine can be in
pub trait State: Clone + Eq + Hash {
    fn on_enter(&self) {}
    fn on_exit(&self) {}
}

/// Guard evaluated against the update context
pub type Guard<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

/// Guarded edge to `to`
pub struct Transition<S, C> {
    pub to: S,
    pub guard: Guard<C>,
    /// Higher is checked first; ties keep insertion order
    pub priority: i32,
}

impl<S, C> Transition<S, C> {
    pub fn new<F>(to: S, guard: F, priority: i32) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self {
            to,
            guard: Box::new(guard),
            priority,
        }
    }

    pub fn allows(&self, context: &C) -> bool {
        (self.guard)(context)
    }
}

/// State machine over states `S` driven by a per-update context `C`
pub struct StateMachine<S: State, C> {
    current: S,
    previous: Option<S>,
    edges: HashMap<S, Vec<Transition<S, C>>>,
    /// Edges from any state, checked before `edges`
    global: Vec<Transition<S, C>>,
    /// Seconds since the last state change
    elapsed: f32,
}

impl<S: State, C> StateMachine<S, C> {
    pub fn new(initial: S) -> Self {
        initial.on_enter();
        Self {
            current: initial,
            previous: None,
            edges: HashMap::new(),
            global: Vec::new(),
            elapsed: 0.0,
        }
    }

    /// Add an edge `from -> to` with priority 0
    pub fn add_transition<F>(&mut self, from: S, to: S, guard: F)
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.add_transition_priority(from, to, guard, 0);
    }

    pub fn add_transition_priority<F>(&mut self, from: S, to: S, guard: F, priority: i32)
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        insert_ordered(self.edges.entry(from).or_default(), Transition::new(to, guard, priority));
    }

    /// Add an edge into `to` from every other state
    pub fn add_global_transition<F>(&mut self, to: S, guard: F, priority: i32)
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        insert_ordered(&mut self.global, Transition::new(to, guard, priority));
    }

    pub fn current(&self) -> &S {
        &self.current
    }

    /// State before the most recent change
    pub fn previous(&self) -> Option<&S> {
        self.previous.as_ref()
    }

    pub fn time_in_state(&self) -> f32 {
        self.elapsed
    }

    pub fn is_in(&self, state: &S) -> bool {
        self.current == *state
    }

    /// Move to `to` regardless of guards
    pub fn force_transition(&mut self, to: S) {
        self.current.on_exit();
        let left = std::mem::replace(&mut self.current, to);
        self.previous = Some(left);
        self.current.on_enter();
        self.elapsed = 0.0;
    }

    /// Advance the clock and follow the first open edge.
    ///
    /// Returns the state entered, or `None` if every guard held shut.
    pub fn update(&mut self, context: &C, delta_time: f32) -> Option<S> {
        self.elapsed += delta_time.max(0.0);

        let current = &self.current;
        let to = self
            .global
            .iter()
            .filter(|edge| edge.to != *current)
            .chain(self.edges.get(current).into_iter().flatten())
            .find(|edge| edge.allows(context))?
            .to
            .clone();

        self.force_transition(to.clone());
        Some(to)
    }
}

fn insert_ordered<S, C>(edges: &mut Vec<Transition<S, C>>, edge: Transition<S, C>) {
    let at = edges.partition_point(|e| e.priority >= edge.priority);
    edges.insert(at, edge);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Guarding {
        Resting,
        Alert,
        Fleeing,
    }

    impl State for Guarding {}

    struct Threat {
        noise: f32,
        wounded: bool,
    }

    fn guard_fsm() -> StateMachine<Guarding, Threat> {
        let mut fsm = StateMachine::new(Guarding::Resting);
        fsm.add_transition(Guarding::Resting, Guarding::Alert, |t: &Threat| t.noise > 1.0);
        fsm.add_transition(Guarding::Alert, Guarding::Resting, |t: &Threat| t.noise <= 1.0);
        fsm.add_transition_priority(Guarding::Alert, Guarding::Fleeing, |t: &Threat| t.wounded, 5);
        fsm
    }

    #[test]
    fn test_starts_in_initial_state() {
        let fsm = guard_fsm();
        assert!(fsm.is_in(&Guarding::Resting));
        assert_eq!(fsm.previous(), None);
        assert_eq!(fsm.time_in_state(), 0.0);
    }

    #[test]
    fn test_one_edge_per_update() {
        let mut fsm = guard_fsm();
        let mut threat = Threat {
            noise: 0.0,
            wounded: true,
        };

        assert_eq!(fsm.update(&threat, 0.1), None);

        threat.noise = 3.0;
        assert_eq!(fsm.update(&threat, 0.1), Some(Guarding::Alert));
        assert_eq!(fsm.previous(), Some(&Guarding::Resting));

        // Fleeing outranks calming down, and only fires on the next update
        threat.noise = 0.0;
        assert_eq!(fsm.update(&threat, 0.1), Some(Guarding::Fleeing));
        assert_eq!(fsm.update(&threat, 0.1), None);
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order() {
        let mut fsm = StateMachine::<Guarding, Threat>::new(Guarding::Resting);
        fsm.add_transition(Guarding::Resting, Guarding::Fleeing, |_| true);
        fsm.add_transition(Guarding::Resting, Guarding::Alert, |_| true);

        let threat = Threat {
            noise: 0.0,
            wounded: false,
        };
        assert_eq!(fsm.update(&threat, 0.0), Some(Guarding::Fleeing));
    }

    #[test]
    fn test_global_edge_wins_from_any_state() {
        let mut fsm = guard_fsm();
        fsm.add_global_transition(Guarding::Fleeing, |t: &Threat| t.noise > 10.0, 0);

        let mut threat = Threat {
            noise: 20.0,
            wounded: false,
        };
        // Checked before Resting -> Alert
        assert_eq!(fsm.update(&threat, 0.1), Some(Guarding::Fleeing));
        // No self-loop once there
        assert_eq!(fsm.update(&threat, 0.1), None);
        assert_eq!(fsm.time_in_state(), 0.1);

        threat.noise = 0.0;
        fsm.force_transition(Guarding::Alert);
        assert_eq!(fsm.update(&threat, 0.1), Some(Guarding::Resting));
    }

    #[test]
    fn test_clock_resets_on_change() {
        let mut fsm = guard_fsm();
        let threat = Threat {
            noise: 0.0,
            wounded: false,
        };
        fsm.update(&threat, 0.25);
        fsm.update(&threat, 0.25);
        assert_eq!(fsm.time_in_state(), 0.5);

        // Negative steps do not rewind
        fsm.update(&threat, -1.0);
        assert_eq!(fsm.time_in_state(), 0.5);

        fsm.force_transition(Guarding::Fleeing);
        assert!(fsm.is_in(&Guarding::Fleeing));
        assert_eq!(fsm.previous(), Some(&Guarding::Resting));
        assert_eq!(fsm.time_in_state(), 0.0);
    }
}
