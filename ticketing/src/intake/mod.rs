//! Intake: inbound message → persisted ticket
//!
//! Every call to [`IntakeEngine::ingest`] creates exactly one Pending ticket.
//! Classification and routing problems are absorbed here (sentinel label,
//! fallback team); only a failed store write is surfaced.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::DeskResult;
use crate::events::{DeskEvent, SharedEventBus};
use crate::router::{Classifier, RoutingTable};
use crate::state::{
    CategoryLabel, SharedStore, TicketDraft, TicketId, DEFAULT_CONFIDENTIALITY, FALLBACK_TEAM,
    UNCLASSIFIED_LABEL,
};

/// Reply sent back on the inbound channel
pub const DEFAULT_ACKNOWLEDGEMENT: &str = "Hey, We have received your issue. Our team will resolve it shortly. Thank you for using our service.";

/// Characters of message text carried in events and logs
const PREVIEW_CHARS: usize = 60;

/// Intake settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Confidentiality stamped on new tickets
    pub default_confidentiality: u8,
    /// Category recorded when classification fails
    pub unclassified_label: String,
    /// Team receiving categories nobody owns
    pub fallback_team: String,
    /// Reply text, independent of the classification outcome
    pub acknowledgement: String,
    /// Upper bound on one classification; 0 disables the bound
    pub classify_timeout_secs: u64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            default_confidentiality: DEFAULT_CONFIDENTIALITY,
            unclassified_label: UNCLASSIFIED_LABEL.to_string(),
            fallback_team: FALLBACK_TEAM.to_string(),
            acknowledgement: DEFAULT_ACKNOWLEDGEMENT.to_string(),
            classify_timeout_secs: 5,
        }
    }
}

/// What intake decided for one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeReceipt {
    pub ticket_id: TicketId,
    pub category: CategoryLabel,
    pub routing_team: String,
    /// False when the sentinel label was used
    pub classified: bool,
    pub acknowledgement: String,
}

pub struct IntakeEngine {
    store: SharedStore,
    classifier: Arc<dyn Classifier>,
    config: IntakeConfig,
    events: Option<SharedEventBus>,
}

impl IntakeEngine {
    pub fn new(store: SharedStore, classifier: Arc<dyn Classifier>, config: IntakeConfig) -> Self {
        Self {
            store,
            classifier,
            config,
            events: None,
        }
    }

    pub fn with_events(mut self, bus: SharedEventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Classify, route, and persist one inbound message
    pub async fn ingest(&self, sender_id: &str, text: &str) -> DeskResult<IntakeReceipt> {
        let (category, classified) = self.classify(text).await;
        let routing_team = self.route(&category);

        let ticket = self.store.insert_ticket(TicketDraft {
            sender_id: sender_id.to_string(),
            text: text.to_string(),
            category,
            routing_team,
            confidentiality: self.config.default_confidentiality,
        })?;

        info!(
            ticket_id = ticket.id,
            sender_id,
            category = %ticket.category,
            routing_team = %ticket.routing_team,
            "Ticket created"
        );
        if let Some(bus) = &self.events {
            bus.notify(DeskEvent::TicketCreated {
                ticket_id: ticket.id,
                sender_id: ticket.sender_id.clone(),
                category: ticket.category.clone(),
                routing_team: ticket.routing_team.clone(),
                classified,
                text_preview: ticket.preview(PREVIEW_CHARS),
                timestamp: ticket.created_at,
            });
        }

        Ok(IntakeReceipt {
            ticket_id: ticket.id,
            category: ticket.category,
            routing_team: ticket.routing_team,
            classified,
            acknowledgement: self.config.acknowledgement.clone(),
        })
    }

    /// Label for `text`, or the sentinel when the classifier fails or stalls
    async fn classify(&self, text: &str) -> (CategoryLabel, bool) {
        let outcome = match self.config.classify_timeout_secs {
            0 => self.classifier.classify(text).await,
            secs => {
                let limit = Duration::from_secs(secs);
                match tokio::time::timeout(limit, self.classifier.classify(text)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(timeout_secs = secs, "Classifier timed out");
                        return (self.config.unclassified_label.clone(), false);
                    }
                }
            }
        };

        match outcome {
            Ok(label) => (label, true),
            Err(e) => {
                warn!(error = %e, "Classification failed, using sentinel label");
                (self.config.unclassified_label.clone(), false)
            }
        }
    }

    /// Owning team from the current registry, or the fallback team
    fn route(&self, category: &str) -> String {
        match self.store.list_teams() {
            Ok(teams) => {
                let table = RoutingTable::from_teams(&teams, self.config.fallback_team.as_str());
                if !table.is_routed(category) {
                    debug!(category, fallback = table.fallback(), "No team owns category");
                }
                table.route(category).to_string()
            }
            Err(e) => {
                warn!(error = %e, category, "Team registry unreadable, routing to fallback team");
                self.config.fallback_team.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::classifier::MockClassifier;
    use crate::router::ClassificationUnavailable;
    use crate::state::{MemoryStore, RegistryStore, TicketStatus, TicketStore};
    use async_trait::async_trait;

    fn store_with_billing_team() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert_team("Finance", Some("Billing")).unwrap();
        store
    }

    fn classifier_returning(label: &'static str) -> Arc<dyn Classifier> {
        let mut classifier = MockClassifier::new();
        classifier
            .expect_classify()
            .times(1)
            .returning(move |_| Ok(label.to_string()));
        Arc::new(classifier)
    }

    struct StalledClassifier;

    #[async_trait]
    impl Classifier for StalledClassifier {
        async fn classify(&self, _text: &str) -> Result<CategoryLabel, ClassificationUnavailable> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("Billing".to_string())
        }
    }

    #[tokio::test]
    async fn test_ingest_routes_to_owning_team() {
        let store = store_with_billing_team();
        let engine = IntakeEngine::new(
            store.clone(),
            classifier_returning("Billing"),
            IntakeConfig::default(),
        );

        let receipt = engine
            .ingest("whatsapp:+15550001", "I was charged twice")
            .await
            .unwrap();
        assert_eq!(receipt.ticket_id, 1);
        assert_eq!(receipt.routing_team, "Finance");
        assert!(receipt.classified);
        assert_eq!(receipt.acknowledgement, DEFAULT_ACKNOWLEDGEMENT);

        let ticket = store.get_ticket(1).unwrap().unwrap();
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert_eq!(ticket.assignee, None);
        assert_eq!(ticket.confidentiality, 80);
        assert_eq!(ticket.text, "I was charged twice");
    }

    #[tokio::test]
    async fn test_unowned_category_goes_to_fallback() {
        let engine = IntakeEngine::new(
            store_with_billing_team(),
            classifier_returning("Shipping"),
            IntakeConfig::default(),
        );

        let receipt = engine.ingest("sms:1", "where is my parcel").await.unwrap();
        assert_eq!(receipt.category, "Shipping");
        assert_eq!(receipt.routing_team, "Other");
    }

    #[tokio::test]
    async fn test_classifier_failure_still_creates_ticket() {
        let store = store_with_billing_team();
        let mut classifier = MockClassifier::new();
        classifier
            .expect_classify()
            .returning(|_| Err(ClassificationUnavailable::new("model offline")));
        let engine = IntakeEngine::new(store.clone(), Arc::new(classifier), IntakeConfig::default());

        let receipt = engine.ingest("sms:1", "").await.unwrap();
        assert_eq!(receipt.category, "Unclassified");
        assert_eq!(receipt.routing_team, "Other");
        assert!(!receipt.classified);
        assert_eq!(receipt.acknowledgement, DEFAULT_ACKNOWLEDGEMENT);
        assert_eq!(
            store
                .list_tickets(&crate::state::TicketFilter::all())
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_classifier_times_out() {
        let config = IntakeConfig {
            classify_timeout_secs: 2,
            ..IntakeConfig::default()
        };
        let engine = IntakeEngine::new(
            store_with_billing_team(),
            Arc::new(StalledClassifier),
            config,
        );

        let receipt = engine.ingest("sms:1", "invoice").await.unwrap();
        assert_eq!(receipt.category, "Unclassified");
    }

    #[tokio::test]
    async fn test_custom_acknowledgement_and_confidentiality() {
        let store = store_with_billing_team();
        let config = IntakeConfig {
            default_confidentiality: 50,
            acknowledgement: "Thanks!".to_string(),
            ..IntakeConfig::default()
        };
        let engine = IntakeEngine::new(store.clone(), classifier_returning("Billing"), config);

        let receipt = engine.ingest("sms:1", "bill").await.unwrap();
        assert_eq!(receipt.acknowledgement, "Thanks!");
        assert_eq!(store.get_ticket(1).unwrap().unwrap().confidentiality, 50);
    }

    #[tokio::test]
    async fn test_ingest_publishes_ticket_created() {
        let bus = crate::events::EventBus::new().shared();
        let mut receiver = bus.subscribe();
        let engine = IntakeEngine::new(
            store_with_billing_team(),
            classifier_returning("Billing"),
            IntakeConfig::default(),
        )
        .with_events(bus);

        engine.ingest("sms:1", "invoice").await.unwrap();

        match receiver.recv().await.unwrap() {
            DeskEvent::TicketCreated {
                ticket_id,
                routing_team,
                classified,
                ..
            } => {
                assert_eq!(ticket_id, 1);
                assert_eq!(routing_team, "Finance");
                assert!(classified);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
