//! Core transaction console logic

pub mod editor;
pub mod error;
pub mod gateway;
pub mod list;
pub mod models;
pub mod session;
pub mod time;

pub use editor::{DetailEditor, EditorClosed, SaveStatus};
pub use error::{log_error, CoreError, CoreResult, ErrorCode, ErrorDetails, ErrorSeverity};
pub use gateway::{GatewayRef, HttpGateway, MemoryGateway, TransactionGateway};
pub use list::{PageOutcome, PageRequest, TransactionList};
pub use models::{FieldKind, Filter, FilterForm, QueryResult, Transaction, TransactionField, MAX_PAGE_SIZE};
pub use session::{Session, SessionRef, SessionStore};
