// Observability: run counters

pub mod metrics;
