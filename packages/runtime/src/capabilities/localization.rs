use std::sync::Arc;

use opkit_core::Capability;

use crate::catalog::Catalog;

/// Answers `Scope::describe` lookups from a [`Catalog`].
///
/// Never fires on its own; business logic opts in per call site.
pub struct LocalizationCapability {
    catalog: Arc<dyn Catalog>,
}

impl LocalizationCapability {
    pub const NAME: &'static str = "localization";

    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }
}

impl std::fmt::Debug for LocalizationCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizationCapability").finish_non_exhaustive()
    }
}

impl Capability for LocalizationCapability {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn translate(&self, key: &str) -> Option<String> {
        self.catalog.lookup(key)
    }
}
