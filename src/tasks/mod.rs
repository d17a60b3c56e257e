//! Background Tasks Module
//!
//! Contains the tracker for work that outlives the request that started it.
//!
//! # Tasks
//! - Background refresh: re-fetches a fresh entry after it was served
//! - Eviction: trims a bounded namespace after a write

mod background;

pub use background::BackgroundJobs;
