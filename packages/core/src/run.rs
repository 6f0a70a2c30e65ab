//! Operation instances and their lifecycle.
//!
//! A [`Run`] moves through `Created -> Running -> {Succeeded, Failed,
//! Aborted}`. `Failed` and `Aborted` are both failures for callers; `Aborted`
//! means business logic was cut short by a critical error.

use std::fmt;
use std::sync::Arc;

use crate::capability::{Capabilities, Capability, HookContext};
use crate::error::ProcessError;
use crate::error_set::ErrorSet;
use crate::extensions::Extensions;
use crate::operation::Operation;
use crate::scope::Scope;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Created,
    Running,
    /// Completed without errors.
    Succeeded,
    /// Completed normally with at least one error.
    Failed,
    /// Stopped early by a critical error.
    Aborted,
}

impl State {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }

    /// Whether execution has finished.
    #[must_use]
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Aborted)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// One execution of an operation: params, errors, result and bookkeeping.
///
/// Callers only ever hold a finished run. Every mutator lives on [`Scope`],
/// which exists only while `perform` executes.
pub struct Run<O: Operation> {
    pub(crate) params: O::Params,
    pub(crate) errors: ErrorSet,
    pub(crate) result: O::Output,
    pub(crate) state: State,
    params_json: serde_json::Value,
    extensions: Extensions,
    pub(crate) capabilities: Arc<Capabilities>,
}

impl<O: Operation> Run<O> {
    fn new(params: O::Params, capabilities: Arc<Capabilities>) -> Self {
        let params_json = if capabilities.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::to_value(&params).unwrap_or_else(|err| {
                tracing::warn!(
                    operation = O::name(),
                    error = %err,
                    "params could not be serialized for capabilities"
                );
                serde_json::Value::Null
            })
        };

        Self {
            params,
            errors: ErrorSet::new(),
            result: O::Output::default(),
            state: State::Created,
            params_json,
            extensions: Extensions::new(),
            capabilities,
        }
    }

    /// Entry point: runs `perform` inside the early-exit boundary and returns
    /// the finished run, whatever the outcome.
    pub fn execute(params: O::Params, capabilities: Arc<Capabilities>) -> Self {
        let mut run = Self::new(params, capabilities);
        run.state = State::Running;
        run.fire(|cap, ctx| cap.on_start(ctx));

        let flow = O::perform(&mut Scope::new(&mut run));

        run.state = match flow {
            Err(_) => State::Aborted,
            Ok(()) if run.state == State::Aborted => {
                tracing::warn!(
                    operation = O::name(),
                    "perform returned Ok after a critical error; run stays aborted"
                );
                State::Aborted
            }
            Ok(()) if run.errors.is_empty() => State::Succeeded,
            Ok(()) => State::Failed,
        };

        tracing::debug!(
            operation = O::name(),
            state = %run.state,
            errors = run.errors.len(),
            "operation finished"
        );

        run.fire(|cap, ctx| cap.on_end(ctx));
        run
    }

    /// Invokes `hook` on every composed capability, in composition order.
    pub(crate) fn fire(&mut self, hook: impl Fn(&dyn Capability, &mut HookContext<'_>)) {
        if self.capabilities.is_empty() {
            return;
        }
        let capabilities = Arc::clone(&self.capabilities);
        let mut ctx = HookContext {
            operation: O::name(),
            state: self.state,
            params: &self.params_json,
            errors: &self.errors,
            extensions: &mut self.extensions,
            capabilities: &capabilities,
        };
        for capability in capabilities.iter() {
            hook(capability.as_ref(), &mut ctx);
        }
    }

    /// Returns `true` (and logs) when the run was aborted and must not change.
    pub(crate) fn frozen(&self, attempted: &'static str) -> bool {
        if self.state != State::Aborted {
            return false;
        }
        tracing::warn!(
            operation = O::name(),
            attempted,
            "ignoring mutation after critical error"
        );
        true
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        O::name()
    }

    #[must_use]
    pub fn params(&self) -> &O::Params {
        &self.params
    }

    #[must_use]
    pub fn errors(&self) -> &ErrorSet {
        &self.errors
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The stored result; `O::Output::default()` if business logic never set
    /// one.
    #[must_use]
    pub fn result(&self) -> &O::Output {
        &self.result
    }

    /// Unwraps the result of a successful run.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] wrapping this run if it failed.
    pub fn into_result(self) -> Result<O::Output, ProcessError<O>> {
        if self.is_success() {
            Ok(self.result)
        } else {
            Err(ProcessError::new(self))
        }
    }
}

impl<O: Operation> fmt::Debug for Run<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Run")
            .field("operation", &O::name())
            .field("state", &self.state)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
