//! The run-to-completion event handler: one event in, zero or one
//! transition plus any bubbling invoke calls, then done.

use std::sync::Arc;

use hfsm_core::{trace, Event, EventId, HfsmResult, Trace, TraceLevel};
use hfsm_graph::{StateGraph, StateId};

use crate::transition::TransitionTable;

/// Owns the graph and transition table and drives dispatch. Lives
/// entirely on the event hub's worker thread; nothing here is `Sync`
/// by requirement, only `Send` (it crosses into the worker closure once).
pub struct Dispatcher {
    graph: StateGraph,
    transitions: TransitionTable,
    cursor: Option<StateId>,
    running: bool,
    trace: Arc<dyn Trace>,
}

impl Dispatcher {
    pub fn new(graph: StateGraph, transitions: TransitionTable, trace: Arc<dyn Trace>) -> Self {
        Self { graph, transitions, cursor: None, running: false, trace }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The synthetic initial transition: an empty `chain_from`
    /// and the full ancestor chain of `target` entered root-down.
    pub fn initial_transition(&mut self, target: StateId) -> HfsmResult<()> {
        let mut chain = self.graph.ancestor_chain(target)?;
        chain.reverse();
        for id in chain {
            self.graph.call_entry(id)?;
        }
        self.cursor = Some(target);
        self.running = true;
        Ok(())
    }

    /// Handle one dequeued event. Never panics on graph inconsistency;
    /// logs via the trace hook and aborts just this dispatch step
    /// (graph inconsistencies are treated as implementation bugs).
    pub fn handle_event(&mut self, event: Event) {
        if !self.running {
            trace!(self.trace, TraceLevel::Warn, "dispatcher", "event dropped: machine not running");
            return;
        }
        if event.id() == EventId::START {
            // The initial transition already ran synchronously in `start()`;
            // a second Start event (there should never be one) is a no-op.
            return;
        }
        let current = match self.cursor {
            Some(c) => c,
            None => return,
        };

        if let Some(idx) = self.transitions.find_firing(current, &event) {
            if let Err(err) = self.fire(idx) {
                trace!(self.trace, TraceLevel::Error, "dispatcher", "transition failed: {}", err);
            }
            return;
        }

        if let Err(err) = self.bubble(current, &event) {
            trace!(self.trace, TraceLevel::Error, "dispatcher", "bubbling failed: {}", err);
        }
    }

    /// Invoke `invoke(event)` from `start` up the ancestor chain until one
    /// returns true, or the chain is exhausted (event silently discarded).
    fn bubble(&mut self, start: StateId, event: &Event) -> HfsmResult<()> {
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            if self.graph.call_invoke(id, event)? {
                return Ok(());
            }
            cursor = self.graph.parent(id)?;
        }
        trace!(self.trace, TraceLevel::Debug, "dispatcher", "event {} discarded unhandled", event.name());
        Ok(())
    }

    /// Execute the transition at `idx`: self-loop, terminal, or general.
    fn fire(&mut self, idx: usize) -> HfsmResult<()> {
        let source = self.transitions.source_of(idx);
        match self.transitions.target_of(idx) {
            None => self.fire_terminal(idx, source),
            Some(target) if target == source => {
                self.transitions.run_effect(idx);
                Ok(())
            }
            Some(target) => self.fire_general(idx, source, target),
        }
    }

    fn fire_terminal(&mut self, idx: usize, source: StateId) -> HfsmResult<()> {
        for id in self.graph.ancestor_chain(source)? {
            self.graph.call_exit(id)?;
        }
        self.transitions.run_effect(idx);
        self.cursor = None;
        self.running = false;
        Ok(())
    }

    fn fire_general(&mut self, idx: usize, source: StateId, target: StateId) -> HfsmResult<()> {
        let mut chain_from = self.graph.ancestor_chain(source)?;
        let mut chain_to = self.graph.ancestor_chain(target)?;

        // Strip the common suffix (both chains end at the root); what's
        // left in chain_from is deepest-first up to (excluding) the LCA,
        // what's left in chain_to is deepest-first up to (excluding) the
        // LCA on the target side.
        while let (Some(a), Some(b)) = (chain_from.last(), chain_to.last()) {
            if a != b {
                break;
            }
            chain_from.pop();
            chain_to.pop();
        }

        for id in &chain_from {
            self.graph.call_exit(*id)?;
        }
        self.transitions.run_effect(idx);
        for id in chain_to.iter().rev() {
            self.graph.call_entry(*id)?;
        }
        self.cursor = Some(target);
        Ok(())
    }
}
