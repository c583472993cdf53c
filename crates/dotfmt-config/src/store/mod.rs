//! Per-handle configuration storage with memoized resolution.
//!
//! Entries are `Arc`s behind an `RwLock`, so the lock is only held long
//! enough to clone a pointer. Building a handle's default context happens
//! outside the lock, once, through a [`OnceCell`]. A context that was
//! resolved before its handle is released stays valid for as long as a
//! caller holds it.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::ConfigError;
use crate::resolve::{ConfigDiagnostic, ResolvedContext, resolve};
use crate::value::{ConfigHandle, ConfigKeyMap, ConfigValue, GlobalConfig};
use crate::view::resolved_config;

const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");

struct StoredConfig {
    global: GlobalConfig,
    plugin: ConfigKeyMap,
    default: OnceCell<Arc<ResolvedContext>>,
}

impl StoredConfig {
    fn default_context(&self) -> Arc<ResolvedContext> {
        Arc::clone(
            self.default
                .get_or_init(|| Arc::new(resolve(&self.global, self.plugin.clone()))),
        )
    }
}

/// Thread-safe map from [`ConfigHandle`] to registered configuration.
#[derive(Default)]
pub struct ConfigStore {
    configs: RwLock<HashMap<ConfigHandle, Arc<StoredConfig>>>,
}

impl ConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers configuration under `handle`, replacing any previous entry.
    ///
    /// Resolution is deferred until the handle is first used.
    pub fn register(&self, handle: ConfigHandle, global: GlobalConfig, plugin: ConfigKeyMap) {
        let entry = Arc::new(StoredConfig {
            global,
            plugin,
            default: OnceCell::new(),
        });
        let replaced = self
            .configs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, entry)
            .is_some();
        debug!(target: STORE_TARGET, %handle, replaced, "configuration registered");
    }

    /// Discards the configuration under `handle`. Unknown handles are ignored.
    pub fn release(&self, handle: ConfigHandle) {
        let removed = self
            .configs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle)
            .is_some();
        debug!(target: STORE_TARGET, %handle, removed, "configuration released");
    }

    /// Resolves options for `handle` with per-request `overrides`.
    ///
    /// An empty override map returns the handle's memoized default context;
    /// anything else runs a fresh, uncached pass over the plugin
    /// configuration with the overrides applied on top.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HandleNotFound`] if nothing is registered under
    /// `handle`.
    pub fn resolve(
        &self,
        handle: ConfigHandle,
        overrides: &ConfigKeyMap,
    ) -> Result<Arc<ResolvedContext>, ConfigError> {
        let stored = self.stored(handle)?;
        if overrides.is_empty() {
            return Ok(stored.default_context());
        }

        let mut plugin = stored.plugin.clone();
        plugin.extend(
            overrides
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        Ok(Arc::new(resolve(&stored.global, plugin)))
    }

    /// Diagnostics of the handle's default context.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HandleNotFound`] for unregistered handles.
    pub fn diagnostics(&self, handle: ConfigHandle) -> Result<Vec<ConfigDiagnostic>, ConfigError> {
        Ok(self.stored(handle)?.default_context().diagnostics().to_vec())
    }

    /// Flattened `key -> value` view of the handle's default options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HandleNotFound`] for unregistered handles.
    pub fn resolved_config(
        &self,
        handle: ConfigHandle,
    ) -> Result<BTreeMap<String, ConfigValue>, ConfigError> {
        let context = self.stored(handle)?.default_context();
        Ok(resolved_config(context.options()))
    }

    /// Returns whether `handle` is registered.
    #[must_use]
    pub fn contains(&self, handle: ConfigHandle) -> bool {
        self.configs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&handle)
    }

    fn stored(&self, handle: ConfigHandle) -> Result<Arc<StoredConfig>, ConfigError> {
        self.configs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
            .ok_or(ConfigError::HandleNotFound { handle })
    }
}
