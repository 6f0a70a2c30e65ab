use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use opkit_core::{Capabilities, Capability};
use parking_lot::RwLock;

use crate::capabilities::{LocalizationCapability, LoggingCapability, RedactionCapability};
use crate::catalog::{Catalog, MapCatalog};
use crate::error::ConfigError;
use crate::settings::Settings;
use crate::sink::{LogSink, TracingSink};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// External handles capabilities are built with.
#[derive(Clone)]
pub struct Collaborators {
    pub sink: Arc<dyn LogSink>,
    pub catalog: Arc<dyn Catalog>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            sink: Arc::new(TracingSink),
            catalog: Arc::new(MapCatalog::new()),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// CapabilityRegistry
// ---------------------------------------------------------------------------

/// Builds one capability from settings and collaborators.
pub type CapabilityFactory = Box<
    dyn Fn(&Settings, &Collaborators) -> Result<Arc<dyn Capability>, ConfigError> + Send + Sync,
>;

/// Resolves capability identifiers into capability implementations.
///
/// Identifiers are lowercase ASCII letters, digits and underscores.
/// [`compose`](Self::compose) runs once at startup; an unknown, malformed or
/// repeated identifier fails the whole composition.
pub struct CapabilityRegistry {
    by_name: DashMap<String, CapabilityFactory>,
    /// Registration order, for listing.
    order: RwLock<Vec<String>>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_name: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Creates a registry with `redaction`, `logging` and `localization`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.insert(RedactionCapability::NAME, Box::new(redaction));
        registry.insert(LoggingCapability::NAME, Box::new(logging));
        registry.insert(LocalizationCapability::NAME, Box::new(localization));
        registry
    }

    /// Registers (or replaces) the factory for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedCapability`] if `name` is not a valid
    /// identifier.
    pub fn register(&self, name: &str, factory: CapabilityFactory) -> Result<(), ConfigError> {
        validate_identifier(name)?;
        self.insert(name, factory);
        Ok(())
    }

    fn insert(&self, name: &str, factory: CapabilityFactory) {
        if self.by_name.insert(name.to_string(), factory).is_none() {
            self.order.write().push(name.to_string());
        }
    }

    /// Registered identifiers in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.order.read().clone()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Composes the capabilities named in `settings`, in their listed order.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for the first malformed, repeated or
    /// unregistered identifier, or if a factory fails.
    pub fn compose(
        &self,
        settings: &Settings,
        collaborators: &Collaborators,
    ) -> Result<Capabilities, ConfigError> {
        let mut seen = HashSet::new();
        let mut builder = Capabilities::builder().unwrap_host_params(settings.unwrap_host_params);

        for name in &settings.capabilities {
            validate_identifier(name)?;
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateCapability { name: name.clone() });
            }
            let factory = self
                .by_name
                .get(name)
                .ok_or_else(|| ConfigError::UnknownCapability { name: name.clone() })?;
            builder = builder.with_shared(factory.value()(settings, collaborators)?);
        }

        let capabilities = builder.build();
        tracing::debug!(
            capabilities = ?capabilities.names().collect::<Vec<_>>(),
            "capabilities composed"
        );
        Ok(capabilities)
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn redaction(settings: &Settings, _: &Collaborators) -> Result<Arc<dyn Capability>, ConfigError> {
    Ok(Arc::new(RedactionCapability::new(
        settings.filtered_params.iter().cloned(),
    )?))
}

fn logging(_: &Settings, collaborators: &Collaborators) -> Result<Arc<dyn Capability>, ConfigError> {
    Ok(Arc::new(LoggingCapability::new(Arc::clone(
        &collaborators.sink,
    ))))
}

fn localization(
    _: &Settings,
    collaborators: &Collaborators,
) -> Result<Arc<dyn Capability>, ConfigError> {
    Ok(Arc::new(LocalizationCapability::new(Arc::clone(
        &collaborators.catalog,
    ))))
}

fn validate_identifier(name: &str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::MalformedCapability {
            name: name.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
