//! Session initializer: allow-list parsing and gate evaluation.

use gateway_primitives::{AllowList, Principal, SessionId};
use gateway_tools::descriptor::Catalog;
use gateway_tools::registry::SessionRegistry;
use tracing::info;

/// Builds per-session tool registries from the static catalog.
///
/// Constructed once at process start with the raw allow-list configuration;
/// the parsed set is read-only afterwards and shared by every session.
#[derive(Clone, Debug)]
pub struct SessionInitializer {
    catalog: Catalog,
    allow_list: AllowList,
}

impl SessionInitializer {
    /// Creates an initializer from the catalog and the raw allow-list
    /// configuration value.
    ///
    /// Missing or empty configuration degrades to an empty allow-list, so
    /// gated tools are simply never registered (fail closed) and session
    /// setup cannot crash on unset environment.
    #[must_use]
    pub fn new(catalog: Catalog, raw_allow_list: Option<&str>) -> Self {
        Self {
            catalog,
            allow_list: AllowList::parse(raw_allow_list),
        }
    }

    /// Returns the parsed allow-list.
    #[must_use]
    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Returns the static catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Initializes a session for the authenticated principal.
    ///
    /// Registration completes before the registry is returned, so every
    /// invocation observes the final tool set. Gates are not re-checked per
    /// call: a tool either exists for the session or does not.
    #[must_use]
    pub fn initialize(&self, principal: Principal) -> SessionRegistry {
        let session_id = SessionId::random();
        info!(%session_id, login = principal.login(), "initializing gateway session");

        let registry = SessionRegistry::build(session_id, principal, &self.catalog, &self.allow_list);

        info!(
            %session_id,
            tools = registry.list().len(),
            "gateway session ready"
        );

        registry
    }
}
