//! Backup provider abstraction and registry.

use crate::backup::BackupEngine;
use crate::exec::RemoteExec;
use crate::progress::{progress_channel, ProgressEmitter};
use async_trait::async_trait;
use podvault_core::{
    BackupOptions, BackupResult, EngineConfig, Error, Progress, Result, FILESYSTEM_PROVIDER,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A source of backups
#[async_trait]
pub trait BackupProvider: Send + Sync {
    /// Provider name, recorded as the metadata `type`
    fn name(&self) -> &'static str;

    /// Check options before any remote interaction
    fn validate_options(&self, opts: &BackupOptions) -> Result<()>;

    /// Estimated archive size in bytes
    async fn estimate_size(&self, opts: &BackupOptions) -> Result<u64>;

    /// Run the backup
    async fn execute(
        &self,
        opts: &BackupOptions,
        progress: ProgressEmitter,
        cancel: CancellationToken,
    ) -> Result<BackupResult>;

    /// A fresh progress channel sized for this provider
    fn stream_progress(&self) -> (ProgressEmitter, mpsc::Receiver<Progress>);
}

/// Backs up a container directory with `tar` over `kubectl exec`
pub struct FilesystemProvider {
    engine: BackupEngine,
}

impl FilesystemProvider {
    pub fn new(exec: Arc<dyn RemoteExec>, config: EngineConfig) -> Self {
        Self {
            engine: BackupEngine::new(exec, config),
        }
    }
}

#[async_trait]
impl BackupProvider for FilesystemProvider {
    fn name(&self) -> &'static str {
        FILESYSTEM_PROVIDER
    }

    fn validate_options(&self, opts: &BackupOptions) -> Result<()> {
        BackupEngine::validate_options(opts)
    }

    async fn estimate_size(&self, opts: &BackupOptions) -> Result<u64> {
        self.engine.estimate_size(opts).await
    }

    async fn execute(
        &self,
        opts: &BackupOptions,
        progress: ProgressEmitter,
        cancel: CancellationToken,
    ) -> Result<BackupResult> {
        self.engine.execute(opts, progress, cancel).await
    }

    fn stream_progress(&self) -> (ProgressEmitter, mpsc::Receiver<Progress>) {
        progress_channel(self.engine.config().progress_capacity)
    }
}

/// Constructor stored in a [`ProviderRegistry`]
pub type ProviderConstructor = fn(Arc<dyn RemoteExec>, EngineConfig) -> Box<dyn BackupProvider>;

fn filesystem_provider(exec: Arc<dyn RemoteExec>, config: EngineConfig) -> Box<dyn BackupProvider> {
    Box::new(FilesystemProvider::new(exec, config))
}

/// Name to constructor map, populated explicitly by the caller.
#[derive(Default)]
pub struct ProviderRegistry {
    constructors: BTreeMap<&'static str, ProviderConstructor>,
}

impl ProviderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in providers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(FILESYSTEM_PROVIDER, filesystem_provider);
        registry
    }

    /// Add or replace a provider
    pub fn register(&mut self, name: &'static str, constructor: ProviderConstructor) {
        self.constructors.insert(name, constructor);
    }

    /// Build the named provider
    pub fn create(
        &self,
        name: &str,
        exec: Arc<dyn RemoteExec>,
        config: EngineConfig,
    ) -> Result<Box<dyn BackupProvider>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| Error::unknown_provider(name))?;
        Ok(constructor(exec, config))
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }
}
