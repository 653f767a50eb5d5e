//! # gallery-store
//!
//! Relational storage for the gallery, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for users and
//! images. Schema migrations run when the handle is opened.

pub mod database;
pub mod images;
pub mod migrations;
pub mod models;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
