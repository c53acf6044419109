//! Local workspace: the persisted replica plus a logged-in sync context

use anyhow::{Context, Result};
use dialoguer::Password;
use std::path::PathBuf;
use std::sync::Arc;

use menagerie::AgentBackend;
use menagerie_sync::{HttpAgentBackend, MemoryGraph, SyncContext};

use crate::config::Config;

const PASSWORD_ENV: &str = "MENAGERIE_PASSWORD";

pub struct Workspace {
    graph: Arc<MemoryGraph>,
    ctx: SyncContext,
    replica_path: PathBuf,
}

impl Workspace {
    /// Load the replica; nobody is logged in yet
    pub fn open(config: &Config) -> Result<Self> {
        let replica_path = config.replica_path()?;
        let graph = MemoryGraph::open(&replica_path)
            .with_context(|| format!("Failed to open replica at {:?}", replica_path))?;
        let ctx = SyncContext::with_memory_graph(graph.clone(), config.sync_config()?);

        Ok(Self {
            graph,
            ctx,
            replica_path,
        })
    }

    /// Open and log in as the resolved alias
    pub async fn login(config: &Config, alias: Option<&str>) -> Result<Self> {
        let workspace = Self::open(config)?;
        let alias = config
            .alias(alias)
            .context("No alias given and no default alias set. Use -a <alias> or run 'menagerie login'.")?;
        let password = read_password(&alias)?;
        workspace.ctx.session().login(&alias, &password).await?;
        Ok(workspace)
    }

    pub fn ctx(&self) -> &SyncContext {
        &self.ctx
    }

    pub fn backend(&self) -> Result<Arc<dyn AgentBackend>> {
        Ok(Arc::new(HttpAgentBackend::new(self.ctx.config())?))
    }

    /// Write the replica back to disk
    pub fn persist(&self) -> Result<()> {
        self.graph
            .save_snapshot(&self.replica_path)
            .with_context(|| format!("Failed to save replica to {:?}", self.replica_path))?;
        tracing::debug!("Saved replica to {:?}", self.replica_path);
        Ok(())
    }
}

pub fn read_password(alias: &str) -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    Password::new()
        .with_prompt(format!("Password for {}", alias))
        .interact()
        .context("Failed to read password")
}

pub fn read_new_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .context("Failed to read password")
}
