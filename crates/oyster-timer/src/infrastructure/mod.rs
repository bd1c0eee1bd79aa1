//! Infrastructure layer for Oyster Timer.
//!
//! Contains the OS-facing adapters: file-backed storage and configuration,
//! image decoding, the offline asset cache, and the terminal front end.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `oyster_core`, but MUST NOT be imported by the `application` layer.

pub mod image_ingest;
pub mod offline_cache;
pub mod storage;
pub mod terminal;
