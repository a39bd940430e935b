//! Wiring: store, event bus, classifier, and engines built from config

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use ticketing::assignment::AssignmentEngine;
use ticketing::events::{EventBus, EventHistory, SharedEventBus};
use ticketing::intake::IntakeEngine;
use ticketing::registry::TeamRegistry;
use ticketing::router::{CategoryCatalog, Classifier};
use ticketing::state::{DeskStore, EventJournal, MemoryStore, SharedJournal, SharedStore};

use crate::classifier::HttpClassifier;
use crate::config::DeskConfig;

/// Everything the tool server needs, ready to share across requests
#[derive(Clone)]
pub struct Desk {
    pub store: SharedStore,
    pub journal: SharedJournal,
    pub bus: SharedEventBus,
    pub registry: Arc<TeamRegistry>,
    pub intake: Arc<IntakeEngine>,
    pub assignment: Arc<AssignmentEngine>,
    pub categories: CategoryCatalog,
}

impl Desk {
    /// Build from configuration: open the store, pick the classifier, seed teams
    pub fn open(config: &DeskConfig) -> Result<Self> {
        let classifier = build_classifier(config)?;
        match &config.state_path {
            Some(path) => open_persistent(path, classifier, config),
            None => {
                info!("Using in-memory state");
                Self::with_store(Arc::new(MemoryStore::new()), classifier, config)
            }
        }
    }

    /// Build around an existing backend
    pub fn with_store<S>(
        store: Arc<S>,
        classifier: Arc<dyn Classifier>,
        config: &DeskConfig,
    ) -> Result<Self>
    where
        S: DeskStore + EventJournal + 'static,
    {
        let journal: SharedJournal = store.clone();
        let store: SharedStore = store;
        let bus = EventBus::with_persistence(journal.clone()).shared();

        let registry = TeamRegistry::new(store.clone()).with_events(bus.clone());
        let seeded = registry
            .seed_teams(&config.teams)
            .context("Failed to seed teams")?;
        info!(teams = seeded.len(), "Team registry ready");

        let intake = IntakeEngine::new(store.clone(), classifier, config.intake.clone())
            .with_events(bus.clone());
        let assignment =
            AssignmentEngine::new(store.clone(), config.assignment).with_events(bus.clone());

        Ok(Self {
            store,
            journal,
            bus,
            registry: Arc::new(registry),
            intake: Arc::new(intake),
            assignment: Arc::new(assignment),
            categories: config.categories.clone(),
        })
    }

    /// Replay access to the journaled events
    pub fn history(&self) -> EventHistory {
        EventHistory::new(self.journal.clone())
    }
}

/// HTTP gateway when an endpoint is configured, keyword rules otherwise
pub fn build_classifier(config: &DeskConfig) -> Result<Arc<dyn Classifier>> {
    match &config.classifier.url {
        Some(url) => {
            let timeout = Duration::from_secs(config.classifier.timeout_secs);
            let classifier =
                HttpClassifier::new(url.clone(), timeout).context("Failed to create HTTP client")?;
            info!(url = %classifier.url(), "Using HTTP classifier");
            Ok(Arc::new(classifier))
        }
        None => {
            let classifier = config.classifier.keyword_classifier();
            info!(rules = classifier.rules().len(), "Using keyword classifier");
            Ok(Arc::new(classifier))
        }
    }
}

#[cfg(feature = "heavy-state")]
fn open_persistent(
    path: &std::path::Path,
    classifier: Arc<dyn Classifier>,
    config: &DeskConfig,
) -> Result<Desk> {
    info!("State path: {}", path.display());
    let store = ticketing::state::RocksStore::open(path)
        .with_context(|| format!("Failed to open state store at {}", path.display()))?
        .shared();
    Desk::with_store(store, classifier, config)
}

#[cfg(not(feature = "heavy-state"))]
fn open_persistent(
    path: &std::path::Path,
    _classifier: Arc<dyn Classifier>,
    _config: &DeskConfig,
) -> Result<Desk> {
    anyhow::bail!(
        "state path {} requires building with the heavy-state feature",
        path.display()
    )
}
