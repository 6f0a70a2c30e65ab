use std::fmt;

use crate::error_set::ErrorSet;
use crate::operation::Operation;
use crate::run::Run;

/// Raised by [`Run::into_result`] when the run failed.
///
/// Wraps the failed run itself, so the boundary that catches it can still
/// inspect params, errors and state.
#[derive(thiserror::Error)]
#[error("{name} failed")]
pub struct ProcessError<O: Operation> {
    name: &'static str,
    run: Box<Run<O>>,
}

impl<O: Operation> ProcessError<O> {
    pub(crate) fn new(run: Run<O>) -> Self {
        Self {
            name: O::name(),
            run: Box::new(run),
        }
    }

    /// The failed run.
    #[must_use]
    pub fn run(&self) -> &Run<O> {
        &self.run
    }

    #[must_use]
    pub fn into_run(self) -> Run<O> {
        *self.run
    }

    #[must_use]
    pub fn errors(&self) -> &ErrorSet {
        self.run.errors()
    }
}

impl<O: Operation> fmt::Debug for ProcessError<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessError")
            .field("operation", &self.name)
            .field("run", &self.run)
            .finish()
    }
}

/// The process-wide capability set was already installed or frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("capabilities are write-once and were already installed")]
pub struct AlreadyInstalled;
