//! Semantic search over a catalog of free online courses.
//!
//! Course rows are ingested from CSV ([`ingest`]), filtered to free courses and
//! embedded once into a [`catalog::CatalogIndex`]. Each query is normalized
//! ([`text`]), embedded with the same [`embed::Embedder`], ranked by cosine
//! similarity ([`search::ranking`]) and rendered as a report ([`format`]).

pub mod catalog;
pub mod config;
pub mod embed;
pub mod error;
pub mod format;
pub mod ingest;
pub mod search;
pub mod text;
pub mod types;

pub use error::{Error, Result};
