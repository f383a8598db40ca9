use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::Arc;

use crate::app_config::Config;
use crate::database::models::{DictionaryStats, SeedPair};
use crate::database::{DatabaseConnection, WordRepository};
use crate::dictionary;
use crate::session::SessionManager;
use crate::transport::Transport;

// @module: Application controller wiring storage, sessions and transports

/// Main application controller for drill sessions
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Shared dictionary storage
    repo: WordRepository,
    // @field: Dialogue engine, shareable across serving tasks
    manager: Arc<SessionManager>,
}

impl Controller {
    /// Create a new controller for test purposes with an in-memory database
    pub fn new_for_test() -> Result<Self> {
        let repo = WordRepository::new_in_memory()?;
        Ok(Self::with_repository(Config::default(), repo))
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let db_path = config.database_path()?;
        let db = DatabaseConnection::new(&db_path, config.database.busy_timeout())
            .with_context(|| format!("Failed to open dictionary database at {:?}", db_path))?;
        debug!("Using dictionary database at {:?}", db.path());

        Ok(Self::with_repository(config, WordRepository::new(db)))
    }

    // @method: Create a controller over an already opened repository
    pub fn with_repository(config: Config, repo: WordRepository) -> Self {
        let manager = Arc::new(SessionManager::from_config(repo.clone(), &config));
        Self {
            config,
            repo,
            manager,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dialogue engine handle
    pub fn manager(&self) -> Arc<SessionManager> {
        Arc::clone(&self.manager)
    }

    /// Insert shared pairs, returning how many were new
    pub async fn seed(&self, pairs: Vec<SeedPair>) -> Result<usize> {
        let requested = pairs.len();
        let inserted = self
            .repo
            .seed_pairs(pairs)
            .await
            .context("Failed to seed dictionary")?;
        info!(
            "Seeded {} new pair(s), {} already present",
            inserted,
            requested - inserted
        );
        Ok(inserted)
    }

    /// Seed the starter vocabulary when the dictionary has no pairs at all
    pub async fn ensure_seeded(&self) -> Result<usize> {
        if self.stats().await?.pairs > 0 {
            return Ok(0);
        }
        info!("Dictionary is empty, loading the starter vocabulary");
        self.seed(dictionary::default_seed()).await
    }

    /// Dictionary-wide counters
    pub async fn stats(&self) -> Result<DictionaryStats> {
        self.repo
            .stats()
            .await
            .context("Failed to read dictionary statistics")
    }

    /// Feed every message from a transport through the session engine until it closes
    ///
    /// Returns the number of inbound messages handled.
    pub async fn serve<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<usize> {
        let mut handled = 0;

        while let Some(message) = transport.receive().await {
            let replies = self.manager.handle(message).await;
            for reply in &replies {
                transport
                    .send(reply)
                    .await
                    .context("Failed to deliver reply")?;
            }
            handled += 1;

            let evicted = self.manager.evict_idle_sessions();
            if evicted > 0 {
                debug!("Dropped {} idle session(s)", evicted);
            }
        }

        if handled == 0 {
            warn!("Transport closed before any message arrived");
        }
        info!("Transport closed after {} message(s)", handled);
        Ok(handled)
    }
}
