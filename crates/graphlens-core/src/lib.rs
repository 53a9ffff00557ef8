#![forbid(unsafe_code)]
//! graphlens-core library.
//!
//! Canonical graph model, ingestion normalizer, exchange format, snapshot
//! store and random graph generation.
//!
//! # Conventions
//!
//! - **Errors**: component-scoped `thiserror` enums, each mapped to an
//!   [`error::ErrorCode`]. `anyhow::Result` only for configuration loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod error;
pub mod exchange;
pub mod generate;
pub mod graph;
pub mod ingest;
pub mod store;

pub use error::{ErrorCode, GenerateError, GraphError, IngestError, StoreError};
pub use graph::{Adjacency, CanonicalGraph, Edge, Node, Properties};
pub use ingest::{FieldMapping, InputFormat, Ingestion, IngestWarning, Normalizer, normalize};
pub use store::{DirSnapshotStore, SnapshotInfo, SnapshotStore};
