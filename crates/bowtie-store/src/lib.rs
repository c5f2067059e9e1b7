//! Bowtie Storage Layer
//!
//! Durable per-input processing state for resumable batch runs.
//!
//! # Architecture
//!
//! - One CSV manifest, one row per input file, keyed by `source_path`
//! - Rows are held in memory and rewritten in full on `save()`
//! - Every write goes through [`atomic_write`] (temp file + rename), so a
//!   crash mid-write leaves the previous version intact
//!
//! The store has a single owner: the orchestrator's writer loop.
//!
//! # Examples
//!
//! ```no_run
//! use bowtie_domain::ManifestEntry;
//! use bowtie_store::ManifestStore;
//!
//! let mut store = ManifestStore::open("data/manifests/structured_manifest.csv").unwrap();
//! store.upsert(ManifestEntry::pending("data/text/INC-1.txt", "INC-1", "stub"));
//! store.save().unwrap();
//! ```

#![warn(missing_docs)]

mod atomic;
mod error;
mod manifest;

pub use atomic::atomic_write;
pub use error::StoreError;
pub use manifest::ManifestStore;
