//! Albumsync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `LocalFile`, `Inventory`, `AlbumSyncState`, `LedgerEntry`
//! - **Port definitions** - Traits for adapters: `IRemoteStore`, `ICaptureTimeSource`
//! - **Error taxonomy** - `SyncError` classifying failures by how callers recover
//! - **Configuration** - Typed config mapping to the YAML configuration file
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O. Ports define
//! trait interfaces whose implementations live outside this workspace (the
//! remote photo store) or in the engine crate (capture-time lookup).

pub mod config;
pub mod domain;
pub mod ports;
