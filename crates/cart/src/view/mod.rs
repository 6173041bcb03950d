//! Cart view-model.
//!
//! [`CartView`] holds the signed-in user's cart rows and the set of rows the
//! user has checked, and drives the backend for loads, removals and checkout.
//!
//! State lives behind a `tokio` lock so operations take `&self`; two loads can
//! be in flight at once and only the most recently issued one is applied.

mod checkout;
mod display;
#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod fakes;
mod selection;

pub use checkout::{
    CheckoutError, CheckoutReceipt, CommittedTransaction, DeletionReport, FailedDeletion, Notice,
};
pub use display::{CartLineView, CartSummary, EMPTY_CART_MESSAGE};
pub use selection::SelectionSet;

use std::sync::atomic::{AtomicU64, Ordering};

use pickngo_core::{CartItemId, CurrencyCode, Price};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, error, instrument, warn};

use crate::api::{CartItem, CartResource};
use crate::error::{CartError, add_breadcrumb};
use crate::session::{CurrentUser, SessionError};

/// What a [`CartView::load`] call did to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the cart rows.
    Applied {
        /// Rows now in the cart.
        count: usize,
    },
    /// A later load was issued before this one finished; its response was dropped.
    Superseded,
}

#[derive(Debug, Default)]
struct CartState {
    items: Vec<CartItem>,
    selection: SelectionSet,
}

impl CartState {
    fn all_ids(&self) -> SelectionSet {
        self.items.iter().map(|item| item.id).collect()
    }

    fn all_selected(&self) -> bool {
        !self.items.is_empty() && self.selection == self.all_ids()
    }

    fn selected_items(&self) -> Vec<CartItem> {
        self.items
            .iter()
            .filter(|item| self.selection.contains(item.id))
            .cloned()
            .collect()
    }

    fn total(&self) -> Decimal {
        self.items
            .iter()
            .filter(|item| self.selection.contains(item.id))
            .map(CartItem::line_total)
            .sum()
    }

    /// Drop `id` from rows and selection; returns whether the row was present.
    fn prune(&mut self, id: CartItemId) -> bool {
        self.selection.remove(id);
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }
}

/// View-model for one user's cart.
pub struct CartView<C, T> {
    carts: C,
    transactions: T,
    user: CurrentUser,
    currency: CurrencyCode,
    state: RwLock<CartState>,
    /// Ticket of the most recently issued load.
    load_seq: AtomicU64,
}

impl<C, T> CartView<C, T> {
    /// Create an empty view for `user`. Nothing is fetched until [`Self::load`].
    pub fn new(user: CurrentUser, carts: C, transactions: T) -> Self {
        Self {
            carts,
            transactions,
            user,
            currency: CurrencyCode::default(),
            state: RwLock::new(CartState::default()),
            load_seq: AtomicU64::new(0),
        }
    }

    /// Create a view from the raw session-storage user blob.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if no usable user is stored; no request is made.
    pub fn from_session(
        raw_session_user: Option<&str>,
        carts: C,
        transactions: T,
    ) -> Result<Self, SessionError> {
        let user = CurrentUser::from_session_json(raw_session_user)?;
        Ok(Self::new(user, carts, transactions))
    }

    /// Use `currency` when formatting prices.
    #[must_use]
    pub fn with_currency(mut self, currency: CurrencyCode) -> Self {
        self.currency = currency;
        self
    }

    pub const fn user(&self) -> &CurrentUser {
        &self.user
    }

    /// Cart rows in server order.
    pub async fn items(&self) -> Vec<CartItem> {
        self.state.read().await.items.clone()
    }

    pub async fn selection(&self) -> SelectionSet {
        self.state.read().await.selection.clone()
    }

    pub async fn is_selected(&self, id: CartItemId) -> bool {
        self.state.read().await.selection.contains(id)
    }

    /// Checked rows in cart order; selected ids with no row are skipped.
    pub async fn selected_items(&self) -> Vec<CartItem> {
        self.state.read().await.selected_items()
    }

    /// Whether every row is checked. Always derived from the current rows.
    pub async fn all_selected(&self) -> bool {
        self.state.read().await.all_selected()
    }

    /// Sum of price × quantity over the checked rows.
    pub async fn total_price(&self) -> Price {
        Price::new(self.state.read().await.total(), self.currency)
    }

    /// Display model of the whole panel.
    pub async fn summary(&self) -> CartSummary {
        let state = self.state.read().await;
        CartSummary::build(
            &state.items,
            &state.selection,
            state.all_selected(),
            Price::new(state.total(), self.currency),
        )
    }

    /// Flip whether `id` is checked; returns whether it is now checked.
    pub async fn toggle_selection(&self, id: CartItemId) -> bool {
        self.state.write().await.selection.toggle(id)
    }

    /// Check every row, or uncheck all when every row is already checked.
    ///
    /// Returns whether every row is now checked.
    pub async fn select_all(&self) -> bool {
        let mut state = self.state.write().await;
        let all = state.all_ids();
        if state.selection == all {
            state.selection.clear();
        } else {
            state.selection = all;
        }
        state.all_selected()
    }
}

impl<C: CartResource, T> CartView<C, T> {
    /// Fetch the user's cart rows and replace the local copy.
    ///
    /// Selection is left as-is. Every row in the response is kept, including
    /// rows with zero quantity or a negative price, which are logged. If a later
    /// load was issued while this one was in flight, the response is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Api`] if the request fails; local state is unchanged.
    #[instrument(skip(self), fields(user = %self.user.name))]
    pub async fn load(&self) -> Result<LoadOutcome, CartError> {
        let ticket = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let items = match self.carts.list_for_user(&self.user.name).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Failed to fetch cart items");
                return Err(e.into());
            }
        };

        for item in items.iter().filter(|item| !item.is_valid()) {
            warn!(item_id = %item.id, "Cart row has zero quantity or a negative price");
        }

        let mut state = self.state.write().await;
        if ticket != self.load_seq.load(Ordering::SeqCst) {
            debug!(ticket, "Dropping superseded cart load");
            return Ok(LoadOutcome::Superseded);
        }

        let count = items.len();
        state.items = items;
        drop(state);

        debug!(count, "Cart loaded");
        let count_label = count.to_string();
        add_breadcrumb("cart", "Loaded cart", Some(&[("count", count_label.as_str())]));
        Ok(LoadOutcome::Applied { count })
    }

    /// Delete one row on the backend, then drop it locally.
    ///
    /// Returns whether the row was present locally.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Api`] if the delete fails; local state is unchanged.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn remove_item(&self, id: CartItemId) -> Result<bool, CartError> {
        if let Err(e) = self.carts.delete_item(id).await {
            error!(error = %e, "Failed to delete cart item");
            return Err(e.into());
        }

        let was_present = self.state.write().await.prune(id);
        let id_label = id.to_string();
        add_breadcrumb("cart", "Removed item", Some(&[("item_id", id_label.as_str())]));
        Ok(was_present)
    }
}
