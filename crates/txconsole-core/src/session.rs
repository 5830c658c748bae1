//! Console sessions: per-browser filter, accumulated rows and open editors

use crate::editor::DetailEditor;
use crate::error::{CoreError, CoreResult};
use crate::gateway::GatewayRef;
use crate::list::TransactionList;
use crate::models::Filter;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Shared handle to one session
pub type SessionRef = Arc<Mutex<Session>>;

pub struct Session {
    pub id: Uuid,
    pub list: TransactionList,
    editors: HashMap<u64, DetailEditor>,
}

impl Session {
    fn new(id: Uuid, filter: Filter) -> Self {
        Self {
            id,
            list: TransactionList::new(filter),
            editors: HashMap::new(),
        }
    }

    /// Open an editor on a loaded row, or return the one already open
    pub fn open_editor(&mut self, id: u64, gateway: GatewayRef, save_delay: Duration) -> CoreResult<DetailEditor> {
        if let Some(editor) = self.editors.get(&id) {
            return Ok(editor.clone());
        }
        let row = self
            .list
            .row(id)
            .cloned()
            .ok_or(CoreError::TransactionNotFound { id })?;
        let editor = DetailEditor::open(row, gateway, save_delay);
        self.editors.insert(id, editor.clone());
        Ok(editor)
    }

    pub fn editor(&self, id: u64) -> CoreResult<DetailEditor> {
        self.editors
            .get(&id)
            .cloned()
            .ok_or(CoreError::EditorNotOpen { id })
    }

    /// Detach an editor so it can be closed outside the session lock
    pub fn take_editor(&mut self, id: u64) -> CoreResult<DetailEditor> {
        self.editors.remove(&id).ok_or(CoreError::EditorNotOpen { id })
    }

    pub fn open_editor_count(&self) -> usize {
        self.editors.len()
    }
}

struct Entry {
    created: u64,
    session: SessionRef,
}

/// All live sessions, capped at `max_sessions`
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    next_seq: AtomicU64,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Create a session; evicts the oldest one when the store is full
    pub async fn create(&self, filter: Filter) -> SessionRef {
        let created = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session::new(id, filter)));

        let evicted = {
            let mut sessions = self.sessions.write().await;
            let mut evicted = Vec::new();
            while sessions.len() >= self.max_sessions {
                let Some(oldest) = sessions.iter().min_by_key(|(_, e)| e.created).map(|(id, _)| *id) else {
                    break;
                };
                if let Some(old) = sessions.remove(&oldest) {
                    evicted.push(old.session);
                }
            }
            sessions.insert(
                id,
                Entry {
                    created,
                    session: Arc::clone(&session),
                },
            );
            evicted
        };

        for old in evicted {
            Self::flush(old).await;
        }
        log::debug!("Created console session {}", id);
        session
    }

    pub async fn get(&self, id: &Uuid) -> CoreResult<SessionRef> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|e| Arc::clone(&e.session))
            .ok_or(CoreError::SessionNotFound)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn flush(session: SessionRef) {
        let (id, editors): (Uuid, Vec<DetailEditor>) = {
            let mut session = session.lock().await;
            (session.id, session.editors.drain().map(|(_, e)| e).collect())
        };
        log::info!("Evicting console session {} ({} open editors)", id, editors.len());
        for editor in editors {
            editor.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use crate::models::{sample_transaction, QueryResult, TransactionField};
    use txconsole_config::FilterConfig;

    fn filter() -> Filter {
        Filter::from_config(&FilterConfig::default())
    }

    async fn loaded_session(store: &SessionStore) -> SessionRef {
        let session = store.create(filter()).await;
        {
            let mut s = session.lock().await;
            let request = s.list.begin_refresh(filter());
            s.list.complete(
                &request,
                QueryResult {
                    items: vec![sample_transaction(1), sample_transaction(2)],
                    count: 2,
                    pagination_token: None,
                },
            );
        }
        session
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = SessionStore::new(4);
        let session = store.create(filter()).await;
        let id = session.lock().await.id;
        assert!(Arc::ptr_eq(&store.get(&id).await.unwrap(), &session));
        assert!(matches!(store.get(&Uuid::new_v4()).await, Err(CoreError::SessionNotFound)));
    }

    #[tokio::test]
    async fn test_oldest_session_is_evicted() {
        let store = SessionStore::new(2);
        let first = store.create(filter()).await.lock().await.id;
        let second = store.create(filter()).await.lock().await.id;
        let third = store.create(filter()).await.lock().await.id;

        assert_eq!(store.len().await, 2);
        assert!(store.get(&first).await.is_err());
        assert!(store.get(&second).await.is_ok());
        assert!(store.get(&third).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_flushes_open_editors() {
        let gateway = Arc::new(MemoryGateway::new(vec![sample_transaction(1), sample_transaction(2)]));
        let store = SessionStore::new(1);
        let session = loaded_session(&store).await;

        let editor = session
            .lock()
            .await
            .open_editor(2, gateway.clone(), Duration::from_secs(60))
            .unwrap();
        editor.edit(TransactionField::MerchantName, "Evicted Edit").await.unwrap();

        store.create(filter()).await;
        assert_eq!(gateway.get(2).await.unwrap().merchant_name, "Evicted Edit");
        assert_eq!(session.lock().await.open_editor_count(), 0);
    }

    #[tokio::test]
    async fn test_editor_lookup() {
        let gateway: GatewayRef = Arc::new(MemoryGateway::new(Vec::new()));
        let store = SessionStore::new(4);
        let session = loaded_session(&store).await;
        let mut s = session.lock().await;

        assert!(matches!(s.editor(1), Err(CoreError::EditorNotOpen { id: 1 })));
        assert!(matches!(
            s.open_editor(9, gateway.clone(), Duration::from_millis(500)),
            Err(CoreError::TransactionNotFound { id: 9 })
        ));

        let editor = s.open_editor(1, gateway.clone(), Duration::from_millis(500)).unwrap();
        let again = s.open_editor(1, gateway, Duration::from_millis(500)).unwrap();
        assert_eq!(editor.id(), again.id());
        assert_eq!(s.open_editor_count(), 1);
        assert_eq!(s.editor(1).unwrap().id(), 1);

        s.take_editor(1).unwrap();
        assert!(s.take_editor(1).is_err());
    }
}
