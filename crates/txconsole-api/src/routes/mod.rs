//! Route modules for the console server
//!
//! - transactions: transaction list, filter editor, detail editor
//! - time: calendar lookups
//!
//! Each page module follows the same structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: HTMX endpoints
//! - page.rs: HTML rendering

pub mod time;
pub mod transactions;
