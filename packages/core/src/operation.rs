use std::sync::Arc;

use serde::Serialize;

use crate::capability::{self, Capabilities};
use crate::run::Run;
use crate::scope::Scope;

/// Description used by `error_code` / `critical_error_code`.
pub const DEFAULT_ERROR_DESCRIPTION: &str = "An error occurred";

/// Early-exit token returned by [`Scope::critical_error`].
///
/// Only this crate can construct a `Halt`, so `perform` can only return one
/// after a critical error was actually recorded.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "propagate the halt with `?` so no further business logic runs"]
pub struct Halt {
    _private: (),
}

impl Halt {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// Result of a business-logic step: `Err(Halt)` aborts the run.
pub type Flow = Result<(), Halt>;

/// A discrete unit of business logic.
///
/// Implementors supply `perform`; callers use [`call`](Self::call) or
/// [`call_with`](Self::call_with), which always return the finished [`Run`].
///
/// ```
/// use opkit_core::{Flow, Operation, Scope};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Signup {
///     name: String,
/// }
///
/// struct CreateUser;
///
/// impl Operation for CreateUser {
///     type Params = Signup;
///     type Output = Option<String>;
///
///     fn perform(scope: &mut Scope<'_, Self>) -> Flow {
///         if scope.params().name.is_empty() {
///             return scope.critical_error("empty_name", "Name cannot be empty");
///         }
///         let name = scope.params().name.clone();
///         scope.set_result(Some(name));
///         Ok(())
///     }
/// }
///
/// let run = CreateUser::call(Signup { name: String::new() });
/// assert!(run.is_failure());
/// assert_eq!(run.result(), &None);
/// ```
///
/// An operation without business logic is rejected at compile time:
///
/// ```compile_fail
/// use opkit_core::Operation;
///
/// struct Hollow;
///
/// impl Operation for Hollow {
///     type Params = ();
///     type Output = ();
/// }
/// ```
pub trait Operation: Sized {
    /// Immutable input. Serialized for capabilities that log it.
    type Params: Serialize;

    /// Result value; `Default::default()` stands for "unset".
    type Output: Default;

    /// The business logic.
    fn perform(scope: &mut Scope<'_, Self>) -> Flow;

    /// Name used in logs and failure messages. Defaults to the type path.
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Runs the operation with the process-wide capability set.
    fn call(params: Self::Params) -> Run<Self> {
        Run::execute(params, capability::installed())
    }

    /// Runs the operation with an explicit capability set.
    fn call_with(capabilities: &Arc<Capabilities>, params: Self::Params) -> Run<Self> {
        Run::execute(params, Arc::clone(capabilities))
    }
}
