//! Policy Module
//!
//! Request classification and the per-class caching policies.

mod classifier;
mod rules;

pub use classifier::{RequestClassifier, ResourceHint};
pub use rules::{
    ClassifierRules, Policy, PolicySet, ResourceClass, Strategy, DEFAULT_API_MAX_AGE,
    DEFAULT_STATIC_MAX_AGE, DEFAULT_TILE_MAX_AGE, DEFAULT_TILE_MAX_ENTRIES,
    DEFAULT_TILE_PATH_PATTERN,
};
