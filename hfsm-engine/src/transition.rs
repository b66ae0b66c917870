//! Transitions: the directed edges of the state graph.

use hfsm_core::{Error, Event, HfsmResult};
use hfsm_graph::StateId;

type TriggeredAction = Box<dyn FnMut(&Event) -> bool + Send>;
type GuardAction = Box<dyn FnMut() -> bool + Send>;
type EffectAction = Box<dyn FnMut() + Send>;

/// A directed edge from a source state to an optional target.
///
/// `target: None` denotes a terminal transition: firing it exits the
/// machine entirely rather than entering anything.
pub struct Transition {
    source: StateId,
    target: Option<StateId>,
    name: Option<&'static str>,
    triggered: Option<TriggeredAction>,
    guard: Option<GuardAction>,
    effect: Option<EffectAction>,
}

impl Transition {
    pub fn source(&self) -> StateId {
        self.source
    }

    pub fn target(&self) -> Option<StateId> {
        self.target
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// A transition fires iff `triggered` returns true (absence means
    /// "never fires") AND `guard` returns true (absence means "always
    /// true" — there is simply nothing gating the transition further).
    fn fires(&mut self, event: &Event) -> bool {
        let triggered = match self.triggered.as_mut() {
            Some(f) => f(event),
            None => false,
        };
        if !triggered {
            return false;
        }
        match self.guard.as_mut() {
            Some(g) => g(),
            None => true,
        }
    }

    fn run_effect(&mut self) {
        if let Some(effect) = self.effect.as_mut() {
            effect();
        }
    }
}

/// Builder for a single [`Transition`], passed to
/// [`TransitionTable::add`] / [`crate::StateMachineBuilder::add_transition`].
pub struct TransitionSpec {
    source: StateId,
    target: Option<StateId>,
    name: Option<&'static str>,
    triggered: Option<TriggeredAction>,
    guard: Option<GuardAction>,
    effect: Option<EffectAction>,
}

impl TransitionSpec {
    /// A transition into `target`. Self-loops (`target == source`, set
    /// explicitly) and terminal edges (`target: None`, via
    /// [`TransitionSpec::terminal`]) are both ordinary `Transition`s.
    pub fn new(source: StateId, target: StateId) -> Self {
        Self { source, target: Some(target), name: None, triggered: None, guard: None, effect: None }
    }

    /// A transition with no target: firing it exits the machine.
    pub fn terminal(source: StateId) -> Self {
        Self { source, target: None, name: None, triggered: None, guard: None, effect: None }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn on_triggered<F: FnMut(&Event) -> bool + Send + 'static>(mut self, f: F) -> Self {
        self.triggered = Some(Box::new(f));
        self
    }

    pub fn on_guard<F: FnMut() -> bool + Send + 'static>(mut self, f: F) -> Self {
        self.guard = Some(Box::new(f));
        self
    }

    pub fn on_effect<F: FnMut() + Send + 'static>(mut self, f: F) -> Self {
        self.effect = Some(Box::new(f));
        self
    }

    fn build(self) -> Transition {
        Transition {
            source: self.source,
            target: self.target,
            name: self.name,
            triggered: self.triggered,
            guard: self.guard,
            effect: self.effect,
        }
    }
}

/// The machine's transition list, scanned in registration order so the
/// dispatcher's "first match wins" rule is just "lowest
/// index wins".
#[derive(Default)]
pub struct TransitionTable {
    transitions: Vec<Transition>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self { transitions: Vec::new() }
    }

    /// Register a transition. Rejects a duplicate `(source, target)` pair
    /// per the engine's no-duplicate-edge invariant.
    pub fn add(&mut self, spec: TransitionSpec) -> HfsmResult<()> {
        let (source, target) = (spec.source, spec.target);
        if self.transitions.iter().any(|t| t.source == source && t.target == target) {
            return Err(Error::DuplicateTransition);
        }
        self.transitions.push(spec.build());
        Ok(())
    }

    /// The first registered transition from `source` whose trigger and
    /// guard both pass for `event`, if any.
    pub fn find_firing(&mut self, source: StateId, event: &Event) -> Option<usize> {
        self.transitions
            .iter_mut()
            .position(|t| t.source == source && t.fires(event))
    }

    pub fn source_of(&self, idx: usize) -> StateId {
        self.transitions[idx].source
    }

    pub fn target_of(&self, idx: usize) -> Option<StateId> {
        self.transitions[idx].target
    }

    pub fn run_effect(&mut self, idx: usize) {
        self.transitions[idx].run_effect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hfsm_core::{EventId, Priority};

    fn evt() -> Event {
        Event::new(EventId::user(1), "e", Priority::Low)
    }

    #[test]
    fn missing_triggered_never_fires() {
        let mut t = TransitionSpec::new(state_id_for_test(0), state_id_for_test(1)).build();
        assert!(!t.fires(&evt()));
    }

    #[test]
    fn missing_guard_defaults_true() {
        let mut t = TransitionSpec::new(state_id_for_test(0), state_id_for_test(1))
            .on_triggered(|_| true)
            .build();
        assert!(t.fires(&evt()));
    }

    #[test]
    fn guard_false_blocks_firing() {
        let mut t = TransitionSpec::new(state_id_for_test(0), state_id_for_test(1))
            .on_triggered(|_| true)
            .on_guard(|| false)
            .build();
        assert!(!t.fires(&evt()));
    }

    #[test]
    fn duplicate_source_target_rejected() {
        let mut table = TransitionTable::new();
        let s0 = state_id_for_test(0);
        let s1 = state_id_for_test(1);
        table.add(TransitionSpec::new(s0, s1).on_triggered(|_| true)).unwrap();
        let err = table.add(TransitionSpec::new(s0, s1).on_triggered(|_| false)).unwrap_err();
        assert_eq!(err, Error::DuplicateTransition);
    }

    // `StateId` has no public constructor outside `hfsm-graph`; tests here
    // build one indirectly through a real graph to stay within the public API.
    fn state_id_for_test(n: usize) -> StateId {
        use hfsm_graph::StateSpec;
        let (mut graph, root) = hfsm_graph::StateGraph::new(StateSpec::new());
        let mut last = root;
        for _ in 0..n {
            last = graph.add_state(last, StateSpec::new()).unwrap();
        }
        last
    }
}
