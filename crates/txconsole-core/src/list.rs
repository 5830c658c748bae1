//! Accumulated transaction rows for the current filter
//!
//! The list hands out a `PageRequest` for every fetch and only accepts the
//! page back if it still belongs to the current filter generation, so rows
//! are always the in-order concatenation of the pages fetched for the
//! filter on screen.

use crate::models::{Filter, QueryResult, Transaction};

/// A page fetch issued by the list, to be handed back on completion
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub generation: u64,
    pub filter: Filter,
}

/// What happened to a completed page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Rows were appended starting at `from`
    Appended { from: usize },
    /// The filter changed while the page was in flight; nothing was applied
    Stale,
}

#[derive(Debug, Clone)]
pub struct TransactionList {
    filter: Filter,
    rows: Vec<Transaction>,
    next_token: Option<String>,
    generation: u64,
    in_flight: bool,
    loaded: bool,
}

impl TransactionList {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter: filter.first_page(),
            rows: Vec::new(),
            next_token: None,
            generation: 0,
            in_flight: false,
            loaded: false,
        }
    }

    /// Replace the filter and restart accumulation from the first page
    pub fn begin_refresh(&mut self, filter: Filter) -> PageRequest {
        self.generation += 1;
        self.filter = filter.first_page();
        self.rows.clear();
        self.next_token = None;
        self.in_flight = true;
        self.loaded = false;
        PageRequest {
            generation: self.generation,
            filter: self.filter.clone(),
        }
    }

    /// Request the page after the last one received
    ///
    /// Returns `None` when there is no continuation token or a fetch is
    /// already running.
    pub fn begin_load_more(&mut self) -> Option<PageRequest> {
        if self.in_flight {
            return None;
        }
        let token = self.next_token.clone()?;
        self.in_flight = true;
        Some(PageRequest {
            generation: self.generation,
            filter: self.filter.with_token(token),
        })
    }

    /// Accept a fetched page for `request`
    pub fn complete(&mut self, request: &PageRequest, result: QueryResult) -> PageOutcome {
        if request.generation != self.generation {
            log::debug!(
                "Discarding page for generation {} (current {})",
                request.generation,
                self.generation
            );
            return PageOutcome::Stale;
        }
        let from = self.rows.len();
        self.rows.extend(result.items);
        self.next_token = result.pagination_token;
        self.in_flight = false;
        self.loaded = true;
        PageOutcome::Appended { from }
    }

    /// Release the in-flight guard after a failed fetch; false if the request was stale
    pub fn fail(&mut self, request: &PageRequest) -> bool {
        if request.generation != self.generation {
            return false;
        }
        self.in_flight = false;
        true
    }

    /// Replace the row with the same id; false if no such row is loaded
    pub fn replace_row(&mut self, transaction: Transaction) -> bool {
        match self.rows.iter_mut().find(|row| row.id == transaction.id) {
            Some(row) => {
                *row = transaction;
                true
            }
            None => false,
        }
    }

    pub fn row(&self, id: u64) -> Option<&Transaction> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn has_more(&self) -> bool {
        self.next_token.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Whether the first page for the current filter has arrived
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_transaction;
    use txconsole_config::FilterConfig;

    fn page(ids: &[u64], token: Option<&str>) -> QueryResult {
        QueryResult {
            items: ids.iter().map(|id| sample_transaction(*id)).collect(),
            count: ids.len(),
            pagination_token: token.map(String::from),
        }
    }

    fn ids(list: &TransactionList) -> Vec<u64> {
        list.rows().iter().map(|t| t.id).collect()
    }

    fn default_filter() -> Filter {
        Filter::from_config(&FilterConfig::default())
    }

    #[test]
    fn test_pages_concatenate_in_order() {
        let mut list = TransactionList::new(default_filter());
        let first = list.begin_refresh(default_filter());
        assert_eq!(list.complete(&first, page(&[1, 2], Some("t1"))), PageOutcome::Appended { from: 0 });
        assert!(list.has_more());

        let more = list.begin_load_more().unwrap();
        assert_eq!(more.filter.pagination_token.as_deref(), Some("t1"));
        assert_eq!(list.complete(&more, page(&[3], None)), PageOutcome::Appended { from: 2 });

        assert_eq!(ids(&list), vec![1, 2, 3]);
        assert!(!list.has_more());
        assert!(list.begin_load_more().is_none());
    }

    #[test]
    fn test_filter_change_discards_rows() {
        let mut list = TransactionList::new(default_filter());
        let first = list.begin_refresh(default_filter());
        list.complete(&first, page(&[1, 2], Some("t1")));

        let mut february = default_filter();
        february.month = 2;
        let request = list.begin_refresh(february.clone());
        assert!(list.rows().is_empty());
        assert!(request.filter.pagination_token.is_none());
        list.complete(&request, page(&[7], None));

        assert_eq!(ids(&list), vec![7]);
        assert_eq!(list.filter(), &february);
    }

    #[test]
    fn test_stale_page_is_discarded() {
        let mut list = TransactionList::new(default_filter());
        let first = list.begin_refresh(default_filter());
        list.complete(&first, page(&[1], Some("t1")));
        let more = list.begin_load_more().unwrap();

        let mut changed = default_filter();
        changed.is_fraud = false;
        let refresh = list.begin_refresh(changed);

        assert_eq!(list.complete(&more, page(&[2], Some("t2"))), PageOutcome::Stale);
        assert!(list.rows().is_empty());
        assert!(list.is_loading());

        list.complete(&refresh, page(&[9], None));
        assert_eq!(ids(&list), vec![9]);
        assert!(!list.has_more());
    }

    #[test]
    fn test_load_more_refused_while_in_flight() {
        let mut list = TransactionList::new(default_filter());
        let first = list.begin_refresh(default_filter());
        assert!(list.begin_load_more().is_none());
        list.complete(&first, page(&[1], Some("t1")));

        let more = list.begin_load_more().unwrap();
        assert!(list.begin_load_more().is_none());

        assert!(list.fail(&more));
        assert_eq!(ids(&list), vec![1]);
        assert!(list.begin_load_more().is_some());
    }

    #[test]
    fn test_replace_row() {
        let mut list = TransactionList::new(default_filter());
        let first = list.begin_refresh(default_filter());
        list.complete(&first, page(&[1, 2], None));

        let mut edited = sample_transaction(2);
        edited.merchant_name = "Lyft".to_string();
        assert!(list.replace_row(edited));
        assert_eq!(list.row(2).unwrap().merchant_name, "Lyft");
        assert_eq!(ids(&list), vec![1, 2]);

        assert!(!list.replace_row(sample_transaction(5)));
    }
}
