//! In-memory backend used by the view tests.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pickngo_core::{CartItemId, TransactionId, UserName};
use rust_decimal::Decimal;

use crate::api::{ApiError, CartItem, CartResource, TransactionRecord, TransactionResource};

/// A request the fake received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Delete(CartItemId),
    Create(TransactionRecord),
}

/// Shared fake for both resources; clones see the same state.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    rows: Vec<CartItem>,
    calls: Vec<Call>,
    created: Vec<TransactionRecord>,
    fail_list: bool,
    fail_delete: HashSet<CartItemId>,
    fail_create: HashSet<String>,
    omit_transaction_ids: bool,
    scripted_lists: VecDeque<(Duration, Vec<CartItem>)>,
}

impl FakeBackend {
    pub fn with_rows(rows: Vec<CartItem>) -> Self {
        let fake = Self::default();
        fake.inner.lock().unwrap().rows = rows;
        fake
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn created(&self) -> Vec<TransactionRecord> {
        self.inner.lock().unwrap().created.clone()
    }

    pub fn rows(&self) -> Vec<CartItem> {
        self.inner.lock().unwrap().rows.clone()
    }

    pub fn set_rows(&self, rows: Vec<CartItem>) {
        self.inner.lock().unwrap().rows = rows;
    }

    pub fn fail_list(&self, fail: bool) {
        self.inner.lock().unwrap().fail_list = fail;
    }

    pub fn fail_delete(&self, id: CartItemId) {
        self.inner.lock().unwrap().fail_delete.insert(id);
    }

    pub fn fail_create(&self, product_name: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_create
            .insert(product_name.to_string());
    }

    /// Acknowledge creates without returning a server id.
    pub fn omit_transaction_ids(&self, omit: bool) {
        self.inner.lock().unwrap().omit_transaction_ids = omit;
    }

    /// Make the next list call answer `rows` after `delay`, ignoring stored rows.
    pub fn script_list(&self, delay: Duration, rows: Vec<CartItem>) {
        self.inner
            .lock()
            .unwrap()
            .scripted_lists
            .push_back((delay, rows));
    }
}

impl CartResource for FakeBackend {
    async fn list_for_user(&self, user: &UserName) -> Result<Vec<CartItem>, ApiError> {
        let (fail, scripted, rows) = {
            let mut state = self.inner.lock().unwrap();
            state.calls.push(Call::List(user.to_string()));
            let rows: Vec<CartItem> = state
                .rows
                .iter()
                .filter(|row| row.user_name == user.as_str())
                .cloned()
                .collect();
            (state.fail_list, state.scripted_lists.pop_front(), rows)
        };

        if fail {
            return Err(ApiError::Status {
                status: 503,
                message: "unavailable".to_string(),
            });
        }

        match scripted {
            Some((delay, rows)) => {
                tokio::time::sleep(delay).await;
                Ok(rows)
            }
            None => Ok(rows),
        }
    }

    async fn delete_item(&self, id: CartItemId) -> Result<(), ApiError> {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(Call::Delete(id));

        if state.fail_delete.contains(&id) {
            return Err(ApiError::Status {
                status: 500,
                message: "delete failed".to_string(),
            });
        }

        let before = state.rows.len();
        state.rows.retain(|row| row.id != id);
        if state.rows.len() == before {
            return Err(ApiError::NotFound(format!("/api/carts/{id}")));
        }
        Ok(())
    }
}

impl TransactionResource for FakeBackend {
    async fn create_transaction(
        &self,
        record: &TransactionRecord,
    ) -> Result<Option<TransactionId>, ApiError> {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(Call::Create(record.clone()));

        if state.fail_create.contains(&record.product_name) {
            return Err(ApiError::Status {
                status: 400,
                message: "validation failed".to_string(),
            });
        }

        state.created.push(record.clone());
        if state.omit_transaction_ids {
            return Ok(None);
        }
        let id = i64::try_from(state.created.len()).unwrap_or(i64::MAX);
        Ok(Some(TransactionId::new(id)))
    }
}

/// Cart row for user `alice`.
pub fn row(id: i64, name: &str, cents: i64, quantity: u32, branch: &str) -> CartItem {
    CartItem {
        id: CartItemId::new(id),
        product_name: name.to_string(),
        price: Decimal::new(cents, 2),
        quantity,
        user_name: "alice".to_string(),
        branch_name: branch.to_string(),
    }
}
