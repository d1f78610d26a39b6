//! Storage backends for the Nodes classroom graph
//!
//! This crate provides implementations of the [`GraphRepository`] interface
//! defined in nodes-core, plus the background worker that feeds a
//! repository from the store's mutation sink.
//!
//! [`GraphRepository`]: nodes_core::GraphRepository

pub mod repositories;
pub use repositories::{
    sample_students, InMemoryGraphRepository, JsonFileGraphRepository, SAMPLE_STUDENTS,
};

pub mod worker;
pub use worker::{ChannelSink, PersistenceStats, PersistenceWorker};
