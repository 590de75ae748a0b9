use statig::prelude::*;
use tracing::debug;

use crate::complaints::ComplaintStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Move one step along the cycle
    Advance,
    /// Jump straight to a status (no-op when already there)
    Set(ComplaintStatus),
}

/// Complaint status lifecycle.
///
/// OPEN -> IN_PROGRESS -> RESOLVED -> OPEN. There are no terminal states and
/// no guards; `Set` may jump anywhere.
#[derive(Debug, Default)]
pub struct StatusLifecycle;

#[state_machine(initial = "State::open()", state(derive(Debug, Clone, PartialEq, Eq)))]
impl StatusLifecycle {
    #[state]
    fn open(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::Advance => self.enter(State::in_progress()),
            LifecycleEvent::Set(target) => self.jump(ComplaintStatus::Open, *target),
        }
    }

    #[state]
    fn in_progress(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::Advance => self.enter(State::resolved()),
            LifecycleEvent::Set(target) => self.jump(ComplaintStatus::InProgress, *target),
        }
    }

    #[state]
    fn resolved(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::Advance => self.enter(State::open()),
            LifecycleEvent::Set(target) => self.jump(ComplaintStatus::Resolved, *target),
        }
    }
}

impl StatusLifecycle {
    fn enter(&mut self, next: State) -> Outcome<State> {
        debug!(next = ?status_of(&next), "Lifecycle transition");
        Transition(next)
    }

    fn jump(&mut self, current: ComplaintStatus, target: ComplaintStatus) -> Outcome<State> {
        if current == target {
            debug!(status = %current, "Set to current status, nothing to do");
            return Handled;
        }
        self.enter(state_for(target))
    }
}

fn state_for(status: ComplaintStatus) -> State {
    match status {
        ComplaintStatus::Open => State::open(),
        ComplaintStatus::InProgress => State::in_progress(),
        ComplaintStatus::Resolved => State::resolved(),
    }
}

/// Status represented by a lifecycle state
pub fn status_of(state: &State) -> ComplaintStatus {
    match state {
        State::Open { .. } => ComplaintStatus::Open,
        State::InProgress { .. } => ComplaintStatus::InProgress,
        State::Resolved { .. } => ComplaintStatus::Resolved,
    }
}

/// Status that follows `current` on the cycle
pub fn next_status(current: ComplaintStatus) -> ComplaintStatus {
    let mut machine = StatusLifecycle::default().state_machine();
    machine.handle(&LifecycleEvent::Set(current));
    machine.handle(&LifecycleEvent::Advance);
    status_of(machine.state())
}
