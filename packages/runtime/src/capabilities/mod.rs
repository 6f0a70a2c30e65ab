//! Built-in capabilities.
//!
//! - [`logging`]: timing plus start/end/error log lines
//! - [`redaction`]: filters sensitive params before they are logged
//! - [`localization`]: answers catalog lookups for `Scope::describe`

pub mod localization;
pub mod logging;
pub mod redaction;

pub use localization::LocalizationCapability;
pub use logging::LoggingCapability;
pub use redaction::{RedactionCapability, FILTERED};
