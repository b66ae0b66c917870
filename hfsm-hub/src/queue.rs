//! The bounded priority queue and its worker thread.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use hfsm_core::{trace, Event, NoopTrace, Priority, Trace, TraceLevel};

/// Default queue capacity, matching the original C implementation's
/// `MAX_MESSAGE_NUM` / the C++ port's `MAX_EVENT_NUM`.
pub const DEFAULT_CAPACITY: usize = 64;

struct QueueState {
    lanes: [VecDeque<Event>; 3],
    shutdown: bool,
}

impl QueueState {
    fn len(&self) -> usize {
        self.lanes.iter().map(VecDeque::len).sum()
    }

    fn lane_index(priority: Priority) -> usize {
        match priority {
            Priority::Low => 0,
            Priority::Mid => 1,
            Priority::High => 2,
        }
    }

    /// Pop the front of the highest-priority non-empty lane.
    fn pop_highest(&mut self) -> Option<Event> {
        self.lanes.iter_mut().rev().find_map(VecDeque::pop_front)
    }
}

struct Shared {
    state: Mutex<QueueState>,
    not_empty: Condvar,
    /// Paired with `not_empty` per spec.md §3's "condition variable pair
    /// for non-empty/non-full signaling". `send` never blocks on a full
    /// queue (it fails fast instead), so nothing ever parks here today;
    /// it exists so `shutdown` can wake any thread that might be, keeping
    /// the pair symmetric for a future blocking-send variant.
    not_full: Condvar,
    capacity: usize,
    trace: Arc<dyn Trace>,
}

/// A bounded, priority-ordered, single-consumer/multi-producer event
/// queue with a dedicated dispatch worker.
///
/// Insertion is stable within a priority class (FIFO); across classes,
/// strict priority wins. `send` never blocks: a full queue or a shut-down
/// hub simply rejects the event.
pub struct EventHub {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl EventHub {
    /// Spawn the worker with the default capacity ([`DEFAULT_CAPACITY`])
    /// and no-op tracing.
    pub fn new<F>(dispatch: F) -> Self
    where
        F: FnMut(Event) + Send + 'static,
    {
        Self::with_capacity(DEFAULT_CAPACITY, dispatch, Arc::new(NoopTrace))
    }

    /// Spawn the worker with an explicit capacity and trace sink.
    ///
    /// `dispatch` is called on the worker thread, once per popped event,
    /// with the hub's internal lock released — it may call [`EventHub::send`]
    /// on this same hub (re-entrant enqueue for self-emitted events) without
    /// deadlocking.
    pub fn with_capacity<F>(capacity: usize, mut dispatch: F, trace_sink: Arc<dyn Trace>) -> Self
    where
        F: FnMut(Event) + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                lanes: [VecDeque::new(), VecDeque::new(), VecDeque::new()],
                shutdown: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
            trace: trace_sink,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || {
            loop {
                let event = {
                    let mut state = worker_shared.state.lock().unwrap();
                    loop {
                        if state.shutdown {
                            return;
                        }
                        if let Some(event) = state.pop_highest() {
                            break event;
                        }
                        state = worker_shared.not_empty.wait(state).unwrap();
                    }
                };
                trace!(
                    worker_shared.trace,
                    TraceLevel::Debug,
                    "hub",
                    "dispatching {} (id={})",
                    event.name(),
                    event.id()
                );
                dispatch(event);
            }
        });

        Self { shared, worker: Some(worker) }
    }

    /// Enqueue an event, respecting priority order. Returns `false` if
    /// the queue is full or the hub has been shut down.
    pub fn send(&self, event: Event) -> bool {
        let mut state = self.shared.state.lock().unwrap();
        if state.shutdown {
            trace!(self.shared.trace, TraceLevel::Warn, "hub", "send after shutdown rejected");
            return false;
        }
        if state.len() >= self.shared.capacity {
            trace!(self.shared.trace, TraceLevel::Warn, "hub", "queue full, dropping send");
            return false;
        }
        let lane = QueueState::lane_index(event.priority());
        state.lanes[lane].push_back(event);
        self.shared.not_empty.notify_one();
        true
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark the hub closed, drain pending events without dispatching
    /// them, wake the worker, and join it.
    ///
    /// Cooperative: there is no forced cancellation of an in-progress
    /// `dispatch` call, so a stalled callback stalls shutdown too.
    pub fn shutdown(&mut self) {
        trace!(self.shared.trace, TraceLevel::Info, "hub", "shutdown: draining queue and stopping worker");
        {
            let mut state = self.shared.state.lock().unwrap();
            state.shutdown = true;
            for lane in &mut state.lanes {
                lane.clear();
            }
        }
        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        trace!(self.shared.trace, TraceLevel::Info, "hub", "shutdown: worker joined");
    }
}

impl Drop for EventHub {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.shutdown();
        }
    }
}
