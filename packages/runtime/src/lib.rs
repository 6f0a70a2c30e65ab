//! `opkit` runtime: the optional capabilities (logging, redaction,
//! localization), their settings and registry, and tower adapters.
//!
//! Applications compose capabilities once at startup:
//!
//! ```
//! use std::sync::Arc;
//!
//! use opkit_runtime::{CapabilityRegistry, Collaborators, Settings};
//!
//! let capabilities = CapabilityRegistry::with_builtins()
//!     .compose(&Settings::default(), &Collaborators::default())
//!     .expect("valid settings");
//! let capabilities = Arc::new(capabilities);
//! assert!(capabilities.contains("logging"));
//! ```

pub mod capabilities;
pub mod catalog;
pub mod error;
pub mod registry;
pub mod service;
pub mod settings;
pub mod sink;
pub mod telemetry;

pub use capabilities::{LocalizationCapability, LoggingCapability, RedactionCapability};
pub use catalog::{Catalog, MapCatalog};
pub use error::ConfigError;
pub use registry::{CapabilityFactory, CapabilityRegistry, Collaborators};
pub use service::{build_operation_pipeline, OperationService, StrictLayer, StrictService};
pub use settings::Settings;
pub use sink::{LogSink, MemorySink, TracingSink};

/// Composes the built-in capabilities from `settings` and installs them as
/// the process-wide default used by `Operation::call`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the settings name an unknown or malformed
/// capability, or if capabilities were already installed (or frozen by an
/// earlier `Operation::call`).
pub fn install(settings: &Settings, collaborators: &Collaborators) -> Result<(), ConfigError> {
    let capabilities = CapabilityRegistry::with_builtins().compose(settings, collaborators)?;
    opkit_core::install(capabilities)?;
    tracing::info!(
        capabilities = ?settings.capabilities,
        "operation capabilities installed"
    );
    Ok(())
}
