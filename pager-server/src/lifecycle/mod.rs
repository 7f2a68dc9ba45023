//! Order lifecycle engine
//!
//! The one piece with real temporal logic: reacting to order updates with
//! the initial "dish ready" notification, and escalating unclaimed ready
//! orders through reminders up to the lost-turn reset.
//!
//! # 结构
//!
//! - [`engine`] - pure transition rules + side-effect executor
//! - [`scheduler`] - periodic escalation scan
//!
//! The write-triggered path ([`LifecycleEngine::handle_update`]) only
//! handles the edge-triggered initial notification; the time-based
//! escalation condition is re-evaluated by [`EscalationScheduler`] on a
//! fixed tick, independent of whether any write occurred.

pub mod engine;
pub mod scheduler;

pub use engine::{
    Escalation, LifecycleEngine, MAX_REMINDERS, REMINDER_INTERVAL_MS, due_escalation,
    is_ready_transition,
};
pub use scheduler::EscalationScheduler;
