//! Hook contract and capability composition.
//!
//! A [`Capability`] observes runs through a fixed set of hook points. Every
//! hook defaults to a no-op, so a capability overrides only what it needs.
//! Capabilities are composed once into an ordered, immutable
//! [`Capabilities`] set and shared by every run created from it.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::AlreadyInstalled;
use crate::error_set::ErrorSet;
use crate::extensions::Extensions;
use crate::run::State;

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// Optional cross-cutting behavior attached to runs.
///
/// Hook timing:
/// - `on_start`: before business logic runs
/// - `on_end`: after the early-exit boundary resolves, whatever the outcome
/// - `on_error`: on every non-critical error
/// - `on_critical_error`: on every critical error, before the early exit
///
/// `redact_for_logging` and `translate` are lookups rather than lifecycle
/// hooks: the first rewrites serialized params before they are logged, the
/// second resolves catalog keys for `Scope::describe`.
pub trait Capability: Send + Sync + 'static {
    /// Identifier of this capability (e.g. `"logging"`).
    fn name(&self) -> &'static str;

    fn on_start(&self, _ctx: &mut HookContext<'_>) {}

    fn on_end(&self, _ctx: &mut HookContext<'_>) {}

    fn on_error(&self, _ctx: &mut HookContext<'_>, _code: &str, _description: &str) {}

    fn on_critical_error(&self, _ctx: &mut HookContext<'_>, _code: &str, _description: &str) {}

    /// Rewrites the textual form of the params. Identity by default.
    fn redact_for_logging(&self, params: String) -> String {
        params
    }

    /// Resolves a dotted catalog key. `None` means "not handled here".
    fn translate(&self, _key: &str) -> Option<String> {
        None
    }
}

// ---------------------------------------------------------------------------
// HookContext
// ---------------------------------------------------------------------------

/// View of a run handed to capability hooks.
pub struct HookContext<'a> {
    pub(crate) operation: &'static str,
    pub(crate) state: State,
    pub(crate) params: &'a serde_json::Value,
    pub(crate) errors: &'a ErrorSet,
    pub(crate) extensions: &'a mut Extensions,
    pub(crate) capabilities: &'a Capabilities,
}

impl HookContext<'_> {
    /// Name of the running operation.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Params as serialized at construction. `Null` when no capability is
    /// composed or the params could not be serialized.
    #[must_use]
    pub fn params(&self) -> &serde_json::Value {
        self.params
    }

    /// Params in textual form after every capability's `redact_for_logging`.
    #[must_use]
    pub fn redacted_params(&self) -> String {
        self.capabilities.redact(self.params)
    }

    /// Errors recorded so far, including the one that triggered the hook.
    #[must_use]
    pub fn errors(&self) -> &ErrorSet {
        self.errors
    }

    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        self.extensions
    }
}

impl fmt::Debug for HookContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("operation", &self.operation)
            .field("state", &self.state)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Ordered, immutable set of composed capabilities.
///
/// Hooks fire in composition order. Redaction likewise folds over the set in
/// order, so a redacting capability only needs to be composed, not placed
/// ahead of the logger that reads its output.
#[derive(Clone, Default)]
pub struct Capabilities {
    layers: Vec<Arc<dyn Capability>>,
    unwrap_host_params: bool,
}

impl Capabilities {
    /// A set with no capabilities: every hook is a no-op.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> CapabilitiesBuilder {
        CapabilitiesBuilder::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Names of the composed capabilities in composition order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.layers.iter().map(|layer| layer.name())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    #[must_use]
    pub fn unwrap_host_params(&self) -> bool {
        self.unwrap_host_params
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<dyn Capability>> {
        self.layers.iter()
    }

    /// Renders `params` as text and passes it through every
    /// `redact_for_logging` in order.
    ///
    /// With host-param unwrapping enabled, an object carrying a
    /// `"parameters"` member is replaced by that member first.
    #[must_use]
    pub fn redact(&self, params: &serde_json::Value) -> String {
        let params = if self.unwrap_host_params {
            unwrap_host(params)
        } else {
            params
        };
        self.layers
            .iter()
            .fold(params.to_string(), |text, layer| layer.redact_for_logging(text))
    }

    /// First answer any capability gives for `key`.
    #[must_use]
    pub fn translate(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.translate(key))
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("names", &self.names().collect::<Vec<_>>())
            .field("unwrap_host_params", &self.unwrap_host_params)
            .finish()
    }
}

fn unwrap_host(params: &serde_json::Value) -> &serde_json::Value {
    params
        .as_object()
        .and_then(|obj| obj.get("parameters"))
        .unwrap_or(params)
}

/// Builder for [`Capabilities`].
#[derive(Default)]
pub struct CapabilitiesBuilder {
    layers: Vec<Arc<dyn Capability>>,
    unwrap_host_params: bool,
}

impl CapabilitiesBuilder {
    /// Appends a capability. Hooks fire in the order capabilities are added.
    pub fn with<C: Capability>(mut self, capability: C) -> Self {
        self.layers.push(Arc::new(capability));
        self
    }

    /// Appends an already shared capability.
    pub fn with_shared(mut self, capability: Arc<dyn Capability>) -> Self {
        self.layers.push(capability);
        self
    }

    pub fn unwrap_host_params(mut self, enabled: bool) -> Self {
        self.unwrap_host_params = enabled;
        self
    }

    #[must_use]
    pub fn build(self) -> Capabilities {
        Capabilities {
            layers: self.layers,
            unwrap_host_params: self.unwrap_host_params,
        }
    }
}

// ---------------------------------------------------------------------------
// Process-wide default
// ---------------------------------------------------------------------------

static INSTALLED: OnceLock<Arc<Capabilities>> = OnceLock::new();

/// Installs the process-wide capability set used by `Operation::call`.
///
/// The set is write-once: it must be installed before the first
/// `Operation::call`, which freezes an empty set if nothing was installed.
///
/// # Errors
///
/// Returns [`AlreadyInstalled`] if a set was installed or frozen earlier.
pub fn install(capabilities: Capabilities) -> Result<(), AlreadyInstalled> {
    INSTALLED
        .set(Arc::new(capabilities))
        .map_err(|_| AlreadyInstalled)
}

/// The process-wide capability set, freezing an empty one if none was
/// installed.
#[must_use]
pub fn installed() -> Arc<Capabilities> {
    Arc::clone(INSTALLED.get_or_init(|| Arc::new(Capabilities::none())))
}

// ---------------------------------------------------------------------------
// Catalog keys
// ---------------------------------------------------------------------------

/// Builds the dotted catalog key for an error code raised by `operation`.
///
/// Path segments are snake_cased and joined with `.`; generic arguments are
/// dropped. `my_app::users::CreateUser` with code `empty_name` becomes
/// `my_app.users.create_user.empty_name`.
#[must_use]
pub fn catalog_key(operation: &str, code: &str) -> String {
    let path = operation.split('<').next().unwrap_or(operation);
    let mut key = path
        .split("::")
        .filter(|segment| !segment.is_empty())
        .map(snake_case)
        .collect::<Vec<_>>()
        .join(".");
    key.push('.');
    key.push_str(code);
    key
}

fn snake_case(segment: &str) -> String {
    let chars: Vec<char> = segment.chars().collect();
    let mut out = String::with_capacity(segment.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
