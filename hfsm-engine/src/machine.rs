//! Machine lifecycle: `Configuring -> Running -> Terminated`.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use hfsm_core::{Error, Event, HfsmResult, NoopTrace, Trace};
use hfsm_graph::{StateGraph, StateId, StateSpec};
use hfsm_hub::{EventHub, DEFAULT_CAPACITY};

use crate::dispatcher::Dispatcher;
use crate::transition::{TransitionSpec, TransitionTable};

const RUNNING: u8 = 0;
const TERMINATED: u8 = 1;

/// Assembles a state graph and transition table while `Configuring`, then
/// consumes itself on [`StateMachineBuilder::start`] to spawn the event
/// hub's worker thread. There is no path back to `Configuring`: build a
/// new machine instead.
pub struct StateMachineBuilder {
    graph: StateGraph,
    transitions: TransitionTable,
    capacity: usize,
    trace: Arc<dyn Trace>,
    initial: Option<StateId>,
}

impl StateMachineBuilder {
    /// Start configuring a machine with the given root state.
    pub fn new(root: StateSpec) -> (Self, StateId) {
        let (graph, root_id) = StateGraph::new(root);
        let builder = Self {
            graph,
            transitions: TransitionTable::new(),
            capacity: DEFAULT_CAPACITY,
            trace: Arc::new(NoopTrace),
            initial: None,
        };
        (builder, root_id)
    }

    pub fn add_state(&mut self, parent: StateId, spec: StateSpec) -> HfsmResult<StateId> {
        self.graph.add_state(parent, spec)
    }

    pub fn add_transition(&mut self, spec: TransitionSpec) -> HfsmResult<()> {
        self.transitions.add(spec)
    }

    /// Override the event hub's queue capacity (default [`DEFAULT_CAPACITY`]).
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Install a trace sink shared by the hub and the dispatcher.
    pub fn trace(mut self, trace: Arc<dyn Trace>) -> Self {
        self.trace = trace;
        self
    }

    /// Record the state the initial transition will descend into, ahead
    /// of [`StateMachineBuilder::start`]. Settable any number of times
    /// while `Configuring`; the last call before `start` wins. Mirrors
    /// `original_source/src/hfsm.c::hfsm_set_init_state`, which is a call
    /// distinct from `hfsm_start` in that source file's variant.
    pub fn initial(mut self, initial: StateId) -> Self {
        self.initial = Some(initial);
        self
    }

    /// Run the initial transition into the state recorded by
    /// [`StateMachineBuilder::initial`] (or `initial_override` when given),
    /// spawn the event hub's worker, and hand back a running
    /// [`StateMachine`].
    ///
    /// The initial transition (spec's synthetic `Start` edge) runs
    /// synchronously here, before any worker thread exists, so its
    /// entry callbacks always complete before `start` returns.
    pub fn start(self, initial_override: StateId) -> HfsmResult<StateMachine> {
        let initial = self.initial.unwrap_or(initial_override);
        if !self.graph.contains(initial) {
            return Err(Error::NoSuchState);
        }

        let mut dispatcher = Dispatcher::new(self.graph, self.transitions, Arc::clone(&self.trace));
        dispatcher.initial_transition(initial)?;

        let lifecycle = Arc::new(AtomicU8::new(RUNNING));
        let lifecycle_worker = Arc::clone(&lifecycle);

        let hub = EventHub::with_capacity(
            self.capacity,
            move |event| {
                dispatcher.handle_event(event);
                if !dispatcher.is_running() {
                    lifecycle_worker.store(TERMINATED, Ordering::SeqCst);
                }
            },
            self.trace,
        );

        Ok(StateMachine { hub, lifecycle })
    }
}

/// A running (or just-terminated) state machine.
///
/// All dispatch happens on the event hub's worker thread; this handle is
/// cheap to clone-by-reference (though it is not itself `Clone` — share
/// it behind an `Arc` if multiple producers need it) and every method
/// here only ever touches the hub's queue, never the graph directly.
pub struct StateMachine {
    hub: EventHub,
    lifecycle: Arc<AtomicU8>,
}

impl StateMachine {
    /// Enqueue an event for dispatch. Fails synchronously (without
    /// touching the queue) once the machine has run its terminal
    /// transition, and fails if the queue itself is full.
    pub fn send_event(&self, event: Event) -> HfsmResult<()> {
        if self.is_terminated() {
            return Err(Error::QueueFailure);
        }
        if self.hub.send(event) {
            Ok(())
        } else {
            Err(Error::QueueFailure)
        }
    }

    /// Whether the machine has completed a terminal transition. Once
    /// true, it stays true: there is no path back to `Running`.
    pub fn is_terminated(&self) -> bool {
        self.lifecycle.load(Ordering::SeqCst) == TERMINATED
    }

    pub fn queue_len(&self) -> usize {
        self.hub.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.hub.capacity()
    }

    /// Cooperative shutdown: stop accepting events, drain the queue, and
    /// join the worker thread. Distinct from reaching `Terminated`
    /// through a transition — this is an external stop request.
    pub fn shutdown(mut self) {
        self.hub.shutdown();
    }
}
