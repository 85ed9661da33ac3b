//! Tab and history persistence.
//!
//! Provides SQLite connection management, schema migrations and the
//! [`DbManager`] implementation of the [`PersistenceGateway`] the models use.
//!
//! # Usage
//!
//! ```no_run
//! use browser_models::database::{DbManager, PersistenceGateway};
//!
//! let db = DbManager::open("browser.db").expect("failed to open database");
//! let next_tab_id = db.max_tab_id().unwrap_or(0) + 1;
//! ```

pub mod connection;
pub mod db_manager;
pub mod gateway;
pub mod migrations;

pub use connection::Database;
pub use db_manager::DbManager;
pub use gateway::{DbEvent, PersistenceGateway};
