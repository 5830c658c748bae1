//! Detail editor: an editable copy of one transaction with debounced auto-save
//!
//! Every edit aborts the pending save timer and starts a new one. When a
//! timer runs out the draft is compared with the last stored version and
//! saved only if it differs. Closing the editor aborts the timer and saves
//! any pending draft straight away.

use crate::error::{log_error, CoreError, CoreResult};
use crate::gateway::GatewayRef;
use crate::models::{Transaction, TransactionField};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Save state shown in the editor dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// Draft matches the stored record
    Clean,
    /// Draft has unsaved edits, a save is scheduled
    Dirty,
    Saving,
    Saved,
    /// Last save failed with the given message
    Failed(String),
}

impl SaveStatus {
    pub fn label(&self) -> &str {
        match self {
            SaveStatus::Clean => "No changes",
            SaveStatus::Dirty => "Unsaved changes",
            SaveStatus::Saving => "Saving...",
            SaveStatus::Saved => "Saved",
            SaveStatus::Failed(message) => message,
        }
    }

    /// Whether the status can still change without user input
    pub fn is_pending(&self) -> bool {
        matches!(self, SaveStatus::Dirty | SaveStatus::Saving)
    }
}

/// Result of closing an editor
#[derive(Debug, Clone, PartialEq)]
pub struct EditorClosed {
    /// The editor's copy, which replaces the list row
    pub transaction: Transaction,
    pub status: SaveStatus,
}

struct EditorState {
    draft: Transaction,
    baseline: Transaction,
    status: SaveStatus,
    timer: Option<JoinHandle<()>>,
    generation: u64,
    closed: bool,
}

struct EditorInner {
    id: u64,
    gateway: GatewayRef,
    save_delay: Duration,
    state: Mutex<EditorState>,
    // Serializes saves; always taken before `state`
    save_lock: Mutex<()>,
}

/// Handle to an open detail editor
#[derive(Clone)]
pub struct DetailEditor {
    inner: Arc<EditorInner>,
}

impl DetailEditor {
    pub fn open(transaction: Transaction, gateway: GatewayRef, save_delay: Duration) -> Self {
        log::debug!("Opening editor for transaction {}", transaction.id);
        Self {
            inner: Arc::new(EditorInner {
                id: transaction.id,
                gateway,
                save_delay,
                state: Mutex::new(EditorState {
                    draft: transaction.clone(),
                    baseline: transaction,
                    status: SaveStatus::Clean,
                    timer: None,
                    generation: 0,
                    closed: false,
                }),
                save_lock: Mutex::new(()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub async fn draft(&self) -> Transaction {
        self.inner.state.lock().await.draft.clone()
    }

    pub async fn status(&self) -> SaveStatus {
        self.inner.state.lock().await.status.clone()
    }

    /// Apply one field edit to the draft and restart the save timer
    ///
    /// A rejected value leaves the draft and the timer untouched. Edits
    /// arriving after `close` are refused.
    pub async fn edit(&self, field: TransactionField, value: &str) -> CoreResult<SaveStatus> {
        let mut state = self.inner.state.lock().await;
        if state.closed {
            return Err(CoreError::EditorNotOpen { id: self.inner.id });
        }
        field.apply(&mut state.draft, value)?;

        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.status = if state.draft == state.baseline {
            SaveStatus::Clean
        } else {
            SaveStatus::Dirty
        };

        let inner = Arc::clone(&self.inner);
        let generation = state.generation;
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.save_delay).await;
            inner.save_if_changed(generation).await;
        }));

        Ok(state.status.clone())
    }

    /// Stop the timer and flush a pending draft
    pub async fn close(&self) -> EditorClosed {
        let _save = self.inner.save_lock.lock().await;
        let mut state = self.inner.state.lock().await;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.closed = true;

        if state.draft != state.baseline {
            let snapshot = state.draft.clone();
            state.status = SaveStatus::Saving;
            drop(state);
            log::info!("Flushing unsaved edits of transaction {} on close", self.inner.id);
            let result = self.inner.gateway.save_transaction(&snapshot).await;
            state = self.inner.state.lock().await;
            self.inner.record_result(&mut state, &snapshot, result);
        }

        log::debug!("Closed editor for transaction {}", self.inner.id);
        EditorClosed {
            transaction: state.draft.clone(),
            status: state.status.clone(),
        }
    }
}

impl EditorInner {
    async fn save_if_changed(&self, generation: u64) {
        let _save = self.save_lock.lock().await;
        let mut state = self.state.lock().await;
        if state.closed || state.generation != generation {
            return;
        }
        // The timer has run out; detach so a later edit does not abort this save
        state.timer = None;
        if state.draft == state.baseline {
            return;
        }

        let snapshot = state.draft.clone();
        state.status = SaveStatus::Saving;
        drop(state);

        log::info!("Saving transaction {}", self.id);
        let result = self.gateway.save_transaction(&snapshot).await;
        let mut state = self.state.lock().await;
        self.record_result(&mut state, &snapshot, result);
    }

    fn record_result(&self, state: &mut EditorState, sent: &Transaction, result: CoreResult<Transaction>) {
        let current = state.draft == *sent;
        match result {
            Ok(saved) => {
                state.baseline = saved;
                state.status = if current { SaveStatus::Saved } else { SaveStatus::Dirty };
            }
            Err(error) => {
                log_error(&format!("Save transaction {}", self.id), &error);
                if current {
                    state.status = SaveStatus::Failed(format!("Save failed: {}", error));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::TransactionGateway;
    use crate::models::{sample_transaction, Filter, QueryResult};
    use async_trait::async_trait;

    const DELAY: Duration = Duration::from_millis(500);

    /// Records every save; fails them all when `fail` is set
    #[derive(Default)]
    struct RecordingGateway {
        saves: std::sync::Mutex<Vec<Transaction>>,
        fail: bool,
    }

    impl RecordingGateway {
        fn saves(&self) -> Vec<Transaction> {
            self.saves.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TransactionGateway for RecordingGateway {
        async fn fetch_transactions(&self, _filter: &Filter) -> CoreResult<QueryResult> {
            Ok(QueryResult::default())
        }

        async fn save_transaction(&self, transaction: &Transaction) -> CoreResult<Transaction> {
            self.saves.lock().unwrap().push(transaction.clone());
            if self.fail {
                Err(CoreError::HttpStatus { status: 500, body: "Error updating DynamoDB".to_string() })
            } else {
                Ok(transaction.clone())
            }
        }
    }

    fn editor(gateway: &Arc<RecordingGateway>) -> DetailEditor {
        DetailEditor::open(sample_transaction(1), gateway.clone(), DELAY)
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_saves_once_with_final_state() {
        let gateway = Arc::new(RecordingGateway::default());
        let editor = editor(&gateway);

        for name in ["U", "Ub", "Ube", "Uber Eats"] {
            editor.edit(TransactionField::MerchantName, name).await.unwrap();
            advance(100).await;
        }
        assert!(gateway.saves().is_empty());
        assert_eq!(editor.status().await, SaveStatus::Dirty);

        advance(500).await;
        let saves = gateway.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].merchant_name, "Uber Eats");
        assert_eq!(editor.status().await, SaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_save_without_edits() {
        let gateway = Arc::new(RecordingGateway::default());
        let editor = editor(&gateway);
        advance(2_000).await;
        assert_eq!(editor.close().await.status, SaveStatus::Clean);
        assert!(gateway.saves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_back_to_stored_value_skips_save() {
        let gateway = Arc::new(RecordingGateway::default());
        let editor = editor(&gateway);

        editor.edit(TransactionField::MerchantName, "Lyft").await.unwrap();
        advance(100).await;
        let status = editor.edit(TransactionField::MerchantName, "Uber").await.unwrap();
        assert_eq!(status, SaveStatus::Clean);

        advance(1_000).await;
        assert!(gateway.saves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_quiet_periods_save_separately() {
        let gateway = Arc::new(RecordingGateway::default());
        let editor = editor(&gateway);

        editor.edit(TransactionField::TransactionType, "reversal").await.unwrap();
        advance(600).await;
        editor.edit(TransactionField::MerchantCategoryCode, "Fuel").await.unwrap();
        advance(600).await;

        let saves = gateway.saves();
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[0].transaction_type, "REVERSAL");
        assert_eq!(saves[1].transaction_type, "REVERSAL");
        assert_eq!(saves[1].merchant_category_code, "fuel");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_value_is_rejected() {
        let gateway = Arc::new(RecordingGateway::default());
        let editor = editor(&gateway);

        let err = editor.edit(TransactionField::CreditLimit, "plenty").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidField { .. }));
        assert_eq!(editor.status().await, SaveStatus::Clean);
        assert_eq!(editor.draft().await, sample_transaction(1));

        advance(1_000).await;
        assert!(gateway.saves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_is_reported() {
        let gateway = Arc::new(RecordingGateway { fail: true, ..Default::default() });
        let editor = editor(&gateway);

        editor.edit(TransactionField::IsFraud, "false").await.unwrap();
        advance(600).await;

        assert_eq!(gateway.saves().len(), 1);
        match editor.status().await {
            SaveStatus::Failed(message) => assert!(message.contains("500")),
            other => panic!("unexpected status {:?}", other),
        }
        assert_eq!(editor.draft().await.is_fraud, "FALSE");
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_flushes_pending_edit() {
        let gateway = Arc::new(RecordingGateway::default());
        let editor = editor(&gateway);

        editor.edit(TransactionField::MerchantName, "Corner Store").await.unwrap();
        advance(100).await;
        let closed = editor.close().await;

        assert_eq!(closed.status, SaveStatus::Saved);
        assert_eq!(closed.transaction.merchant_name, "Corner Store");
        assert_eq!(gateway.saves().len(), 1);

        advance(2_000).await;
        assert_eq!(gateway.saves().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_after_save_does_not_resave() {
        let gateway = Arc::new(RecordingGateway::default());
        let editor = editor(&gateway);

        editor.edit(TransactionField::CardCvv, "123").await.unwrap();
        advance(600).await;
        let closed = editor.close().await;

        assert_eq!(gateway.saves().len(), 1);
        assert_eq!(closed.transaction.card_cvv, 123);
        assert_eq!(closed.status, SaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_after_close_is_refused() {
        let gateway = Arc::new(RecordingGateway::default());
        let editor = editor(&gateway);
        let handle = editor.clone();

        editor.close().await;
        let err = handle.edit(TransactionField::MerchantName, "After Close").await.unwrap_err();
        assert!(matches!(err, CoreError::EditorNotOpen { id: 1 }));

        advance(1_000).await;
        assert!(gateway.saves().is_empty());
        assert_eq!(handle.draft().await.merchant_name, sample_transaction(1).merchant_name);
    }
}
