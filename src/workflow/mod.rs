// Status transitions: the cycle itself and the engine that writes it

pub mod engine;
pub mod lifecycle;

pub use engine::{Advance, ReadbackFailure, SetStatusOutcome, TransitionEngine, TransitionError};
pub use lifecycle::{next_status, LifecycleEvent, StatusLifecycle};
