// Run-scoped record storage

pub mod collector;

pub use collector::DeduplicatingCollector;
