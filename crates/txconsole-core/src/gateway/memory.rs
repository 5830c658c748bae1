//! Implements `TransactionGateway` with an in-memory store.
//!
//! Note: this is compiled into the production binary so the whole console can
//! run top-to-bottom (`--demo`) without a transaction API.

use super::TransactionGateway;
use crate::error::{CoreError, CoreResult};
use crate::models::{Filter, QueryResult, Transaction, MAX_PAGE_SIZE};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Seed records used by demo mode
const DEMO_DATA: &str = include_str!("../../data/demo_transactions.json");

/// Holds transactions in memory and answers queries the way the transaction API does
pub struct MemoryGateway {
    store: RwLock<Vec<Transaction>>,
}

impl MemoryGateway {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            store: RwLock::new(transactions),
        }
    }

    /// Store seeded with the bundled demo records
    pub fn with_demo_data() -> CoreResult<Self> {
        let transactions: Vec<Transaction> = serde_json::from_str(DEMO_DATA)?;
        Ok(Self::new(transactions))
    }

    /// Current copy of a stored record
    pub async fn get(&self, id: u64) -> Option<Transaction> {
        self.store.read().await.iter().find(|t| t.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}

#[async_trait]
impl TransactionGateway for MemoryGateway {
    async fn fetch_transactions(&self, filter: &Filter) -> CoreResult<QueryResult> {
        let fraud_flag = if filter.is_fraud { "TRUE" } else { "FALSE" };
        let prefix = filter.date_prefix();

        let store = self.store.read().await;
        let mut matching: Vec<&Transaction> = store
            .iter()
            .filter(|t| t.is_fraud.eq_ignore_ascii_case(fraud_flag))
            .filter(|t| t.transaction_date_time.starts_with(&prefix))
            .collect();
        matching.sort_by(|a, b| {
            a.transaction_date_time
                .cmp(&b.transaction_date_time)
                .then(a.id.cmp(&b.id))
        });

        let offset = match filter.pagination_token.as_deref() {
            None => 0,
            Some(token) => token.parse::<usize>().map_err(|_| CoreError::ValidationError {
                message: format!("Unreadable pagination token '{}'", token),
            })?,
        };
        let page_size = (filter.page_size.value() as usize).min(MAX_PAGE_SIZE);

        let items: Vec<Transaction> = matching
            .iter()
            .skip(offset)
            .take(page_size)
            .map(|t| (*t).clone())
            .collect();
        let next = offset + items.len();
        let pagination_token = (next < matching.len()).then(|| next.to_string());

        Ok(QueryResult {
            count: items.len(),
            items,
            pagination_token,
        })
    }

    async fn save_transaction(&self, transaction: &Transaction) -> CoreResult<Transaction> {
        let mut store = self.store.write().await;
        match store.iter_mut().find(|t| t.id == transaction.id) {
            Some(stored) => {
                *stored = transaction.clone();
                Ok(transaction.clone())
            }
            None => Err(CoreError::TransactionNotFound { id: transaction.id }),
        }
    }
}
