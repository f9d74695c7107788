//! Wizard controller - sequences form sessions into a linear flow
//!
//! The controller is an explicit state machine over step indices plus two
//! terminal states. It owns the accumulator (step id to last-submitted
//! payload, in completion order) and the completed-step set; it never
//! validates step data itself - callers feed it payloads that a
//! [`crate::form::FormSession`] already accepted.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::schema::forms::{WizardSchema, WizardStepSchema};

/// Where the wizard currently is. Terminal states absorb every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    Step(usize),
    Completed,
    Cancelled,
}

type CompleteSink = Box<dyn FnMut(&Map<String, Value>)>;
type CancelSink = Box<dyn FnMut()>;
type StepSink = Box<dyn FnMut(&str, &Map<String, Value>)>;

/// Sequencer for one wizard schema.
pub struct WizardController {
    schema: WizardSchema,
    state: WizardState,
    /// Step id to that step's last-submitted payload. Insertion order is
    /// completion order; overwrites keep the original position.
    data: Map<String, Value>,
    completed: BTreeSet<usize>,
    on_complete: Option<CompleteSink>,
    on_cancel: Option<CancelSink>,
    on_step_submit: Option<StepSink>,
}

impl WizardController {
    pub fn new(schema: WizardSchema) -> Self {
        // A wizard with no steps has nothing to collect.
        let state = if schema.steps.is_empty() {
            WizardState::Completed
        } else {
            WizardState::Step(0)
        };
        WizardController {
            schema,
            state,
            data: Map::new(),
            completed: BTreeSet::new(),
            on_complete: None,
            on_cancel: None,
            on_step_submit: None,
        }
    }

    /// Seed the accumulator for flow resumption. Seeded entries do not
    /// mark their steps completed.
    pub fn with_initial_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Sink invoked once with the full accumulator when the final step
    /// submits. Fire-and-forget: the transition is committed before the
    /// sink runs.
    pub fn on_complete<F>(mut self, sink: F) -> Self
    where
        F: FnMut(&Map<String, Value>) + 'static,
    {
        self.on_complete = Some(Box::new(sink));
        self
    }

    /// Sink invoked on cancellation, with nothing.
    pub fn on_cancel<F>(mut self, sink: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.on_cancel = Some(Box::new(sink));
        self
    }

    /// Sink invoked with (step id, payload) on every successful step
    /// submit, the final one included.
    pub fn on_step_submit<F>(mut self, sink: F) -> Self
    where
        F: FnMut(&str, &Map<String, Value>) + 'static,
    {
        self.on_step_submit = Some(Box::new(sink));
        self
    }

    pub fn schema(&self) -> &WizardSchema {
        &self.schema
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == WizardState::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == WizardState::Cancelled
    }

    pub fn step_count(&self) -> usize {
        self.schema.steps.len()
    }

    pub fn current_step_index(&self) -> Option<usize> {
        match self.state {
            WizardState::Step(i) => Some(i),
            _ => None,
        }
    }

    pub fn current_step(&self) -> Option<&WizardStepSchema> {
        self.current_step_index().map(|i| &self.schema.steps[i])
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step_index() == Some(0)
    }

    pub fn is_last_step(&self) -> bool {
        match self.current_step_index() {
            Some(i) => i + 1 == self.step_count(),
            None => false,
        }
    }

    /// The running accumulator, step id to payload.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// A single step's accumulated payload, if any.
    pub fn step_data(&self, step_id: &str) -> Option<&Map<String, Value>> {
        self.data.get(step_id).and_then(Value::as_object)
    }

    pub fn completed_steps(&self) -> &BTreeSet<usize> {
        &self.completed
    }

    pub fn is_step_completed(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    /// Whether the current step may be skipped: the wizard allows
    /// skipping, the step is optional, and it is not the last.
    pub fn can_skip(&self) -> bool {
        match self.current_step() {
            Some(step) => self.schema.allow_skip && step.optional && !self.is_last_step(),
            None => false,
        }
    }

    /// Progress through the flow as a percentage. A single-step wizard is
    /// by convention already at 100.
    pub fn progress_percent(&self) -> f64 {
        let n = self.step_count();
        match self.state {
            WizardState::Completed => 100.0,
            WizardState::Cancelled => 0.0,
            WizardState::Step(_) if n <= 1 => 100.0,
            WizardState::Step(i) => (i as f64 / (n - 1) as f64) * 100.0,
        }
    }

    /// Record a validated payload for the current step: merge it under the
    /// step id, mark the step completed, then advance - or, on the last
    /// step, transition to `Completed` and emit the full accumulator.
    ///
    /// Re-submitting an already-completed step overwrites its entry
    /// without changing `completed_steps` membership. Returns false in a
    /// terminal state.
    pub fn submit_step(&mut self, payload: Map<String, Value>) -> bool {
        let WizardState::Step(index) = self.state else {
            return false;
        };
        let step_id = self.schema.steps[index].id.clone();

        self.data
            .insert(step_id.clone(), Value::Object(payload.clone()));
        self.completed.insert(index);

        if let Some(sink) = self.on_step_submit.as_mut() {
            sink(&step_id, &payload);
        }

        if index + 1 == self.step_count() {
            self.state = WizardState::Completed;
            if let Some(sink) = self.on_complete.as_mut() {
                sink(&self.data);
            }
        } else {
            self.state = WizardState::Step(index + 1);
        }
        true
    }

    /// Step back one step. No data mutation. Returns false when already on
    /// the first step or in a terminal state.
    pub fn back(&mut self) -> bool {
        match self.state {
            WizardState::Step(i) if i > 0 => {
                self.state = WizardState::Step(i - 1);
                true
            }
            _ => false,
        }
    }

    /// Jump to step `target`. Allowed backwards and to the current step,
    /// or forwards when the step before the target is completed; anything
    /// else is a silent no-op, not an error.
    pub fn go_to(&mut self, target: usize) -> bool {
        let WizardState::Step(current) = self.state else {
            return false;
        };
        if target >= self.step_count() {
            return false;
        }
        let reachable = target <= current || self.completed.contains(&(target - 1));
        if !reachable {
            return false;
        }
        self.state = WizardState::Step(target);
        true
    }

    /// Skip the current step without completing it or touching the
    /// accumulator. Only valid per [`Self::can_skip`].
    pub fn skip(&mut self) -> bool {
        if !self.can_skip() {
            return false;
        }
        if let WizardState::Step(i) = self.state {
            self.state = WizardState::Step(i + 1);
            return true;
        }
        false
    }

    /// Abort the flow from any non-terminal state. Emits nothing but the
    /// cancellation signal.
    pub fn cancel(&mut self) -> bool {
        match self.state {
            WizardState::Completed | WizardState::Cancelled => false,
            WizardState::Step(_) => {
                self.state = WizardState::Cancelled;
                if let Some(sink) = self.on_cancel.as_mut() {
                    sink();
                }
                true
            }
        }
    }
}
