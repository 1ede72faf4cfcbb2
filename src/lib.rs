//! mdfold: Markdown Documents as Directory Trees
//!
//! A bidirectional converter between a structured Markdown document, an
//! ASCII tree plus fenced content blocks, and a physical directory tree.
//! Generation and export are inverses: a tree exported to Markdown and
//! materialized again reproduces the same bytes.

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod fence;
pub mod ignore;
pub mod interactive;
pub mod logging;
pub mod materialize;
pub mod reconcile;
pub mod report;
pub mod serialize;
pub mod tooling;
pub mod tree;
pub mod types;
