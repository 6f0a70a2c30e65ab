//! `opkit` core: operation lifecycle, error sets, early exit, and the hook
//! contract capabilities build on.
//!
//! An [`Operation`] supplies business logic in `perform`. Calling it yields a
//! finished [`Run`]: success is exactly "no errors recorded". Business logic
//! records non-critical errors with [`Scope::error`] and aborts with
//! [`Scope::critical_error`], whose `Err(Halt)` is propagated with `?` and
//! resolved at the entry point, never by the caller.

pub mod capability;
pub mod error;
pub mod error_set;
pub mod extensions;
pub mod operation;
pub mod run;
pub mod scope;

pub use capability::{install, installed, Capabilities, CapabilitiesBuilder, Capability, HookContext};
pub use error::{AlreadyInstalled, ProcessError};
pub use error_set::ErrorSet;
pub use extensions::Extensions;
pub use operation::{Flow, Halt, Operation, DEFAULT_ERROR_DESCRIPTION};
pub use run::{Run, State};
pub use scope::Scope;
