//! Transaction routes - list, filter editor, detail editor
//!
//! Features:
//! - Filtered transaction list with "load more" pagination
//! - Filter editor modal that replaces the whole filter on every change
//! - Detail editor modal with debounced auto-save
//!
//! Structure:
//! - api.rs: HTMX endpoints
//! - page.rs: Page and fragment rendering

pub mod api;
pub mod page;

pub use api::{
    htmx_editor_close,
    htmx_editor_edit,
    htmx_editor_open,
    htmx_editor_status,
    htmx_filter_apply,
    htmx_filter_editor,
    htmx_transactions_list,
    htmx_transactions_more,
    page_index,
};
