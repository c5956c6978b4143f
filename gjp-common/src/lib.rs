//! # GJP Common Library
//!
//! Shared code for the Global Journal Portal client crates:
//! - Error type
//! - Configuration loading and root folder resolution
//! - Event types (PortalEvent enum) and EventBus
//! - Local persistent key/value store
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod events;
pub mod store;
pub mod time;

pub use error::{Error, Result};
pub use store::{FileStore, LocalStore, MemoryStore};
