//! Transaction Gateway - access to the remote transaction resource
//!
//! Implementations:
//! - http: `HttpGateway`, talks to the transaction REST API
//! - memory: `MemoryGateway`, in-process store used by demo mode and tests

mod http;
mod memory;

pub use http::HttpGateway;
pub use memory::MemoryGateway;

use crate::error::{CoreError, CoreResult};
use crate::models::{Filter, QueryResult, Transaction};
use async_trait::async_trait;
use std::sync::Arc;

/// Gateway reference type
pub type GatewayRef = Arc<dyn TransactionGateway>;

/// Trait for transaction stores the console reads from and saves to
#[async_trait]
pub trait TransactionGateway: Send + Sync {
    /// Fetch one page of transactions matching `filter`
    async fn fetch_transactions(&self, filter: &Filter) -> CoreResult<QueryResult>;

    /// Persist the full record under its id and return the stored representation
    async fn save_transaction(&self, transaction: &Transaction) -> CoreResult<Transaction>;
}

/// Interpret the body of a successful update response
///
/// The API may echo the stored transaction or only acknowledge the write
/// with `{"message": ...}`; an acknowledgement means `sent` was stored.
pub(crate) fn decode_saved(body: &str, sent: &Transaction) -> CoreResult<Transaction> {
    if body.trim().is_empty() {
        return Ok(sent.clone());
    }
    if let Ok(saved) = serde_json::from_str::<Transaction>(body) {
        return Ok(saved);
    }
    let value: serde_json::Value = serde_json::from_str(body)?;
    if value.get("message").map_or(false, |m| m.is_string()) {
        Ok(sent.clone())
    } else {
        Err(CoreError::DecodeError {
            message: "update response is neither a transaction nor an acknowledgement".to_string(),
        })
    }
}
