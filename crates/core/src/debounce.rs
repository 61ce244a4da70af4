//! Debounce state machine deciding when a matching record should notify.
//!
//! One [`Debouncer`] covers both alarm policies:
//!
//! - **Simple** (no [`DurationGate`]): a matching record fires when the alarm
//!   has never fired or the cooldown has elapsed since the last firing.
//!   Nothing is sent when the condition stops matching.
//! - **Duration-gated**: every matching record credits one record interval.
//!   The alarm fires once per continuous episode, on the record where the
//!   accumulated time first reaches the threshold (inclusive) and the
//!   cooldown allows it. The first non-matching record after a matching one
//!   resets the counter and emits [`Transition::Cleared`], regardless of
//!   cooldown.
//!
//! ```text
//!                 match, gate reached, cooldown ok
//!   Idle ─────────────► Accumulating ─────────────────────► Active
//!    ▲    match               │                               │
//!    │                        │ no match (Cleared)            │ no match (Cleared)
//!    └────────────────────────┴───────────────────────────────┘
//! ```

use std::time::Duration;

use crate::config::DurationGate;
use crate::types::EpochSeconds;

/// What a single observation asks the caller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to send.
    None,
    /// The condition is armed and the operator should be notified.
    Fired,
    /// The condition stopped holding (duration-gated policy only).
    Cleared,
}

/// Mutable runtime state of one alarm, owned by its evaluator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlarmRuntimeState {
    /// When the last [`Transition::Fired`] was emitted.
    pub last_fired_at: Option<EpochSeconds>,
    /// Consecutive matching records in the current episode.
    pub matched_ticks: u64,
    /// Seconds the condition has held continuously.
    pub accumulated_secs: f64,
    /// An episode has fired and has not cleared yet.
    pub condition_active: bool,
    /// The condition matched on the previous evaluated record.
    pub condition_held: bool,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    cooldown_secs: u64,
    gate: Option<DurationGate>,
    state: AlarmRuntimeState,
}

impl Debouncer {
    pub fn new(cooldown: Duration, gate: Option<DurationGate>) -> Self {
        Self {
            cooldown_secs: cooldown.as_secs(),
            gate,
            state: AlarmRuntimeState::default(),
        }
    }

    pub fn state(&self) -> &AlarmRuntimeState {
        &self.state
    }

    /// Feed the outcome of one evaluation at time `now`.
    pub fn observe(&mut self, condition: bool, now: EpochSeconds) -> Transition {
        match self.gate {
            None => self.observe_simple(condition, now),
            Some(gate) => self.observe_gated(condition, now, gate),
        }
    }

    fn observe_simple(&mut self, condition: bool, now: EpochSeconds) -> Transition {
        if condition && self.cooldown_elapsed(now) {
            self.state.last_fired_at = Some(now);
            return Transition::Fired;
        }
        Transition::None
    }

    fn observe_gated(
        &mut self,
        condition: bool,
        now: EpochSeconds,
        gate: DurationGate,
    ) -> Transition {
        if !condition {
            if !self.state.condition_held {
                return Transition::None;
            }
            self.state.matched_ticks = 0;
            self.state.accumulated_secs = 0.0;
            self.state.condition_active = false;
            self.state.condition_held = false;
            return Transition::Cleared;
        }

        self.state.condition_held = true;
        self.state.matched_ticks += 1;
        self.state.accumulated_secs = self.state.matched_ticks as f64 * gate.interval_secs;

        if self.state.condition_active {
            return Transition::None;
        }
        if threshold_reached(self.state.matched_ticks, gate) && self.cooldown_elapsed(now) {
            self.state.condition_active = true;
            self.state.last_fired_at = Some(now);
            return Transition::Fired;
        }
        Transition::None
    }

    fn cooldown_elapsed(&self, now: EpochSeconds) -> bool {
        match self.state.last_fired_at {
            None => true,
            Some(last) => now.abs_diff(last) >= self.cooldown_secs,
        }
    }
}

/// Compared in whole milliseconds so fractional intervals reach the
/// threshold on the exact tick.
fn threshold_reached(ticks: u64, gate: DurationGate) -> bool {
    let interval_ms = (gate.interval_secs * 1000.0).round() as u64;
    let threshold_ms = (gate.threshold_secs * 1000.0).round() as u64;
    ticks.saturating_mul(interval_ms) >= threshold_ms
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
