#![doc(test(attr(deny(warnings))))]

//! FinTrack engine: the finance core of a personal-finance tracker.
//!
//! Re-exports the domain model and services and adds the [`FinanceEngine`]
//! facade plus repository-backed workflows.

pub mod engine;
pub mod errors;
pub mod utils;
pub mod workflows;

pub use engine::FinanceEngine;
pub use errors::{EngineError, EngineResult};
pub use fintrack_config as config;
pub use fintrack_core as services;
pub use fintrack_domain as domain;
pub use fintrack_storage_json as storage;
pub use workflows::{bill_split_receivable, Repositories};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("FinTrack engine tracing initialized.");
    });
}

/// Initializes tracing with the configured `log_filter` applied.
pub fn init_with(config: &fintrack_config::Config) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing_with(config.log_filter.as_deref());
        tracing::info!("FinTrack engine tracing initialized.");
    });
}
