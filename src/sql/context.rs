//! Per-query execution context.
//!
//! Every statement runs under a [`QueryContext`] carrying the query id
//! (generated fresh per call, threaded through log spans) and the
//! cancellation token operators check between rows.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Cooperative cancellation flag shared by everything running one query.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct QueryContext {
    query_id: Uuid,
    cancel: CancelToken,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::with_cancel(CancelToken::new())
    }

    pub fn with_cancel(cancel: CancelToken) -> Self {
        Self {
            query_id: Uuid::new_v4(),
            cancel,
        }
    }

    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_context_gets_a_unique_id() {
        assert_ne!(QueryContext::new().query_id(), QueryContext::new().query_id());
    }

    #[test]
    fn cancellation_is_shared_through_clones() {
        let token = CancelToken::new();
        let ctx = QueryContext::with_cancel(token.clone());
        assert!(!ctx.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
    }
}
