// Scraping pipeline: traversal, harvesting, extraction, and collection

pub mod extract;
pub mod harvest;
pub mod pacing;
pub mod processing;
pub mod storage;
pub mod traversal;

// Re-export the entry points used by the application layer
pub use traversal::{StopSignal, Termination, TraversalController, TraversalOutcome};
