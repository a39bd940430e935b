//! Classification and routing
//!
//! Turns message text into an owning team in two steps:
//!
//! ```text
//! text ──classify──▶ category label ──route──▶ team name
//!        (Classifier)                (RoutingTable)
//!          │ fails                      │ no owner
//!          ▼                            ▼
//!     "Unclassified"                  "Other"
//! ```
//!
//! Neither step can fail intake: a classifier failure degrades to the
//! sentinel label and an unowned category degrades to the fallback team.

pub mod catalog;
pub mod classifier;
pub mod table;

pub use catalog::CategoryCatalog;
pub use classifier::{ClassificationUnavailable, Classifier, KeywordClassifier, KeywordRule};
pub use table::RoutingTable;
