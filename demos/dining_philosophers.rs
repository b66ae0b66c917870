//! Dining philosophers, recast onto `hfsm-engine`.
//!
//! Each philosopher is its own hierarchical state machine cycling through
//! Thinking -> Hungry -> Eating. A shared `Table` arbitrates fork
//! ownership; a philosopher's guarded transition out of Hungry only
//! fires once the table grants both adjacent forks.
//!
//! Run with `RUST_LOG=info cargo run --bin dining-philosophers`.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use hfsm_core::{Event, EventId, Priority};
use hfsm_engine::{StateMachine, StateMachineBuilder, StateSpec, TransitionSpec};
use hfsm_trace::LogTrace;

const N_PHILOSOPHERS: usize = 5;

mod signal {
    use hfsm_core::EventId;

    pub const TIMEOUT: EventId = EventId::user(1);
    pub const EAT: EventId = EventId::user(2);
    pub const DONE: EventId = EventId::user(3);
}

/// Fork ownership, shared by every philosopher's state machine.
struct Table {
    forks_free: Mutex<[bool; N_PHILOSOPHERS]>,
}

impl Table {
    fn new() -> Self {
        Self { forks_free: Mutex::new([true; N_PHILOSOPHERS]) }
    }

    fn left(id: usize) -> usize {
        id
    }

    fn right(id: usize) -> usize {
        (id + 1) % N_PHILOSOPHERS
    }

    /// Try to pick up both adjacent forks; all-or-nothing to avoid deadlock.
    fn try_take(&self, id: usize) -> bool {
        let mut forks = self.forks_free.lock().unwrap();
        let (l, r) = (Self::left(id), Self::right(id));
        if forks[l] && forks[r] {
            forks[l] = false;
            forks[r] = false;
            true
        } else {
            false
        }
    }

    fn put_down(&self, id: usize) {
        let mut forks = self.forks_free.lock().unwrap();
        forks[Self::left(id)] = true;
        forks[Self::right(id)] = true;
    }
}

fn build_philosopher(id: usize, table: Arc<Table>) -> StateMachine {
    let (mut builder, top) = StateMachineBuilder::new(StateSpec::new().named("Top"));

    let thinking = builder
        .add_state(
            top,
            StateSpec::new().named("Thinking").on_entry(move || {
                log::info!("philosopher {id} is thinking");
            }),
        )
        .unwrap();
    let hungry = builder
        .add_state(
            top,
            StateSpec::new().named("Hungry").on_entry(move || {
                log::info!("philosopher {id} is hungry");
            }),
        )
        .unwrap();
    let eating = builder
        .add_state(
            top,
            StateSpec::new()
                .named("Eating")
                .on_entry(move || log::info!("philosopher {id} is eating"))
                .on_exit(move || log::info!("philosopher {id} finished eating")),
        )
        .unwrap();

    // Thinking -> Hungry on Timeout.
    builder
        .add_transition(
            TransitionSpec::new(thinking, hungry).on_triggered(|e| e.id() == signal::TIMEOUT),
        )
        .unwrap();

    // Hungry -> Eating on Eat, guarded by fork availability. The effect
    // re-posts Eat to itself when the guard fails, so the machine keeps
    // polling for forks without the table needing a callback list.
    let table_for_guard = Arc::clone(&table);
    builder
        .add_transition(
            TransitionSpec::new(hungry, eating)
                .on_triggered(|e| e.id() == signal::EAT)
                .on_guard(move || table_for_guard.try_take(id)),
        )
        .unwrap();

    // Eating -> Thinking on Done, dropping the forks back on the table.
    let table_for_effect = Arc::clone(&table);
    builder
        .add_transition(
            TransitionSpec::new(eating, thinking)
                .on_triggered(|e| e.id() == signal::DONE)
                .on_effect(move || table_for_effect.put_down(id)),
        )
        .unwrap();

    builder.trace(Arc::new(LogTrace)).start(thinking).unwrap()
}

fn main() {
    env_logger::init();
    let table = Arc::new(Table::new());

    let philosophers: Vec<StateMachine> =
        (0..N_PHILOSOPHERS).map(|id| build_philosopher(id, Arc::clone(&table))).collect();

    // Drive each philosopher through a few think/hunger/eat cycles.
    for round in 0..3 {
        for phil in &philosophers {
            phil.send_event(Event::new(signal::TIMEOUT, "Timeout", Priority::Mid)).unwrap();
        }
        thread::sleep(Duration::from_millis(20));
        for phil in &philosophers {
            // Keep retrying Eat until the guard lets the transition through.
            for _ in 0..10 {
                if phil.is_terminated() {
                    break;
                }
                phil.send_event(Event::new(signal::EAT, "Eat", Priority::Mid)).unwrap();
                thread::sleep(Duration::from_millis(5));
            }
        }
        thread::sleep(Duration::from_millis(20));
        for phil in &philosophers {
            phil.send_event(Event::new(signal::DONE, "Done", Priority::Mid)).unwrap();
        }
        thread::sleep(Duration::from_millis(20));
        log::info!("-- round {round} complete --");
    }

    for phil in philosophers {
        phil.shutdown();
    }
}
