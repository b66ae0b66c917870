//! State nodes and the tree that owns them.

use hfsm_core::{Error, Event, HfsmResult};

use crate::MAX_STATE_DEPTH;

/// An index into a [`StateGraph`]'s node vector.
///
/// States are owned by the graph (in turn owned by the state machine) and
/// referenced everywhere else by this cheap, `Copy` handle, sidestepping
/// the cyclic state/parent/machine ownership the original C++ modeled
/// with `shared_ptr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(usize);

/// Entry/exit action: no arguments, no return value.
pub type EntryExitAction = Box<dyn FnMut() + Send>;
/// Invoke action: receives the event, returns whether it was handled.
pub type InvokeAction = Box<dyn FnMut(&Event) -> bool + Send>;

/// A node in the state tree.
pub struct State {
    parent: Option<StateId>,
    name: Option<&'static str>,
    entry: Option<EntryExitAction>,
    exit: Option<EntryExitAction>,
    invoke: Option<InvokeAction>,
}

impl State {
    fn new(parent: Option<StateId>, name: Option<&'static str>) -> Self {
        Self { parent, name, entry: None, exit: None, invoke: None }
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }
}

/// A builder for a single [`State`]'s optional callbacks, passed to
/// [`StateGraph::add_state`] / [`StateGraph::new`].
#[derive(Default)]
pub struct StateSpec {
    name: Option<&'static str>,
    entry: Option<EntryExitAction>,
    exit: Option<EntryExitAction>,
    invoke: Option<InvokeAction>,
}

impl StateSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn on_entry<F: FnMut() + Send + 'static>(mut self, f: F) -> Self {
        self.entry = Some(Box::new(f));
        self
    }

    pub fn on_exit<F: FnMut() + Send + 'static>(mut self, f: F) -> Self {
        self.exit = Some(Box::new(f));
        self
    }

    pub fn on_invoke<F: FnMut(&Event) -> bool + Send + 'static>(mut self, f: F) -> Self {
        self.invoke = Some(Box::new(f));
        self
    }
}

/// The tree of states: parent pointers plus the three queries the rest of
/// the engine needs — ancestor chain, least common ancestor, membership.
///
/// Constructed before `start()`; every mutating method here is expected
/// to be rejected by the owning state machine once it starts running
/// (the graph itself has no notion of "running", it simply trusts its
/// caller to enforce single-writer-before-start discipline).
pub struct StateGraph {
    nodes: Vec<State>,
}

impl StateGraph {
    /// Create a graph with a single root state (no parent).
    pub fn new(spec: StateSpec) -> (Self, StateId) {
        let mut nodes = Vec::new();
        nodes.push(State::new(None, spec.name));
        let root_id = StateId(0);
        let mut graph = Self { nodes };
        graph.nodes[0].entry = spec.entry;
        graph.nodes[0].exit = spec.exit;
        graph.nodes[0].invoke = spec.invoke;
        (graph, root_id)
    }

    /// Add a child state under an existing parent.
    ///
    /// Parents must be added before their children (the graph has no
    /// forward-reference resolution pass); an unknown parent is a
    /// configuration error.
    pub fn add_state(&mut self, parent: StateId, spec: StateSpec) -> HfsmResult<StateId> {
        if !self.contains(parent) {
            return Err(Error::NoSuchState);
        }
        let id = StateId(self.nodes.len());
        let mut node = State::new(Some(parent), spec.name);
        node.entry = spec.entry;
        node.exit = spec.exit;
        node.invoke = spec.invoke;
        self.nodes.push(node);
        // Fail fast on pathological depth rather than overflowing ancestor
        // buffers later, during dispatch, where recovery is harder.
        if self.ancestor_chain(id)?.len() > MAX_STATE_DEPTH {
            self.nodes.pop();
            return Err(Error::StateSizeOverflow);
        }
        Ok(id)
    }

    pub fn contains(&self, id: StateId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn state(&self, id: StateId) -> HfsmResult<&State> {
        self.nodes.get(id.0).ok_or(Error::NoSuchState)
    }

    pub fn parent(&self, id: StateId) -> HfsmResult<Option<StateId>> {
        Ok(self.state(id)?.parent)
    }

    /// The chain from `id` up to (and including) the root: `id` first,
    /// root last.
    pub fn ancestor_chain(&self, id: StateId) -> HfsmResult<Vec<StateId>> {
        let mut chain = vec![id];
        let mut current = id;
        loop {
            match self.parent(current)? {
                Some(parent) => {
                    chain.push(parent);
                    current = parent;
                    if chain.len() > MAX_STATE_DEPTH {
                        return Err(Error::StateSizeOverflow);
                    }
                }
                None => break,
            }
        }
        Ok(chain)
    }

    /// The least common ancestor of `a` and `b`, found by walking both
    /// ancestor chains from the root end inward until they diverge —
    /// equivalent to "strip the common suffix", phrased as a reverse
    /// scan instead of repeated `pop_back`.
    ///
    /// Returns `None` if the two states share no ancestor at all, which
    /// only happens for states from disjoint graphs — a configuration
    /// bug the caller should treat as fatal.
    pub fn lca(&self, a: StateId, b: StateId) -> HfsmResult<Option<StateId>> {
        let chain_a = self.ancestor_chain(a)?;
        let chain_b = self.ancestor_chain(b)?;
        let mut common = None;
        for ra in chain_a.iter().rev() {
            if chain_b.iter().rev().any(|rb| rb == ra) {
                common = Some(*ra);
            } else {
                break;
            }
        }
        Ok(common)
    }

    pub fn call_entry(&mut self, id: StateId) -> HfsmResult<()> {
        if let Some(action) = self.nodes.get_mut(id.0).ok_or(Error::NoSuchState)?.entry.as_mut() {
            action();
        }
        Ok(())
    }

    pub fn call_exit(&mut self, id: StateId) -> HfsmResult<()> {
        if let Some(action) = self.nodes.get_mut(id.0).ok_or(Error::NoSuchState)?.exit.as_mut() {
            action();
        }
        Ok(())
    }

    /// Invoke the state's handler for an unhandled event; `false` if the
    /// state has no invoke callback (the default).
    pub fn call_invoke(&mut self, id: StateId, event: &Event) -> HfsmResult<bool> {
        match self.nodes.get_mut(id.0).ok_or(Error::NoSuchState)?.invoke.as_mut() {
            Some(action) => Ok(action(event)),
            None => Ok(false),
        }
    }
}
