//! Two-phase checkout: create one transaction per checked row, then delete
//! the purchased rows.
//!
//! Creation runs strictly in cart order and stops at the first failure.
//! Transactions created before the failure stay on the backend; nothing is
//! deleted in that case. Deletion is best-effort: each row is attempted even
//! if an earlier one failed, and the cart is reloaded afterwards.

use std::fmt;

use chrono::{NaiveDate, Utc};
use pickngo_core::{CartItemId, TransactionId};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use super::CartView;
use crate::api::{ApiError, CartItem, CartResource, TransactionRecord, TransactionResource};
use crate::error::{add_breadcrumb, capture_error};

/// User-facing message produced by a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Checkout was attempted with nothing checked.
    NothingSelected,
    /// The backend answered a transaction request with a non-success status.
    ItemFailed,
    /// A transaction request failed without a status from the backend.
    CheckoutInterrupted,
    CheckoutSuccessful,
}

impl Notice {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NothingSelected => "Please select items to checkout.",
            Self::ItemFailed => "Failed to process an item. Please try again.",
            Self::CheckoutInterrupted => "An error occurred during checkout. Please try again.",
            Self::CheckoutSuccessful => "Checkout successful",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A transaction that was created for a cart row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedTransaction {
    pub cart_item: CartItemId,
    /// Server id, when the reply carried one.
    pub transaction: Option<TransactionId>,
}

/// A purchased row the backend refused to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDeletion {
    pub id: CartItemId,
    pub reason: String,
}

/// Outcome of the deletion phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub deleted: Vec<CartItemId>,
    pub failed: Vec<FailedDeletion>,
    /// Whether the follow-up reload succeeded.
    pub reloaded: bool,
}

impl DeletionReport {
    /// Every row was deleted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A checkout where every transaction was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    /// One entry per purchased row, in cart order.
    pub transactions: Vec<CommittedTransaction>,
    pub deletion: DeletionReport,
}

impl CheckoutReceipt {
    #[must_use]
    pub const fn notice(&self) -> Notice {
        Notice::CheckoutSuccessful
    }
}

/// Why a checkout stopped before the deletion phase.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No checked id matches a cart row. No request was made.
    #[error("No items selected for checkout")]
    NothingSelected,

    /// Creating the transaction for `item` failed; earlier ones stay committed.
    #[error("Failed to create transaction for cart item {item} ({} already committed): {source}", .committed.len())]
    TransactionFailed {
        item: CartItemId,
        committed: Vec<CommittedTransaction>,
        #[source]
        source: ApiError,
    },
}

impl CheckoutError {
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::NothingSelected => Notice::NothingSelected,
            Self::TransactionFailed { source, .. } if source.status().is_some() => {
                Notice::ItemFailed
            }
            Self::TransactionFailed { .. } => Notice::CheckoutInterrupted,
        }
    }

    /// Transactions that were created before the failure.
    #[must_use]
    pub fn committed(&self) -> &[CommittedTransaction] {
        match self {
            Self::NothingSelected => &[],
            Self::TransactionFailed { committed, .. } => committed,
        }
    }
}

impl<C: CartResource, T: TransactionResource> CartView<C, T> {
    /// Check out the checked rows, dating the transactions today (UTC).
    ///
    /// # Errors
    ///
    /// See [`Self::checkout_on`].
    pub async fn checkout(&self) -> Result<CheckoutReceipt, CheckoutError> {
        self.checkout_on(Utc::now().date_naive()).await
    }

    /// Check out the checked rows, dating the transactions `date`.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NothingSelected`] if no checked id matches a row
    /// - [`CheckoutError::TransactionFailed`] on the first failed creation;
    ///   later rows are not attempted and nothing is deleted
    #[instrument(skip(self), fields(user = %self.user.name))]
    pub async fn checkout_on(&self, date: NaiveDate) -> Result<CheckoutReceipt, CheckoutError> {
        let selected = self.selected_items().await;
        if selected.is_empty() {
            info!("Checkout attempted with nothing selected");
            return Err(CheckoutError::NothingSelected);
        }

        let mut committed = Vec::with_capacity(selected.len());
        for item in &selected {
            let record = TransactionRecord::from_cart_item(item, date);
            match self.transactions.create_transaction(&record).await {
                Ok(transaction) => {
                    info!(item_id = %item.id, transaction_id = ?transaction, "Item processed");
                    committed.push(CommittedTransaction {
                        cart_item: item.id,
                        transaction,
                    });
                }
                Err(source) => {
                    let err = CheckoutError::TransactionFailed {
                        item: item.id,
                        committed,
                        source,
                    };
                    capture_error(&err, "Checkout aborted");
                    return Err(err);
                }
            }
        }

        let deletion = self.finalize_deletion(&selected).await;
        add_breadcrumb("cart", "Checkout successful", None);

        Ok(CheckoutReceipt {
            transactions: committed,
            deletion,
        })
    }

    /// Delete each purchased row, then reload the cart.
    ///
    /// A failed delete is logged and recorded; the remaining rows are still
    /// attempted. Rows deleted on the backend are dropped locally right away.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn finalize_deletion(&self, items: &[CartItem]) -> DeletionReport {
        let mut report = DeletionReport::default();

        for item in items {
            match self.carts.delete_item(item.id).await {
                Ok(()) => {
                    self.state.write().await.prune(item.id);
                    info!(item_id = %item.id, "Purchased item removed from cart");
                    report.deleted.push(item.id);
                }
                Err(e) => {
                    error!(item_id = %item.id, error = %e, "Failed to delete purchased item");
                    report.failed.push(FailedDeletion {
                        id: item.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.reloaded = self.load().await.is_ok();
        if !report.reloaded {
            warn!("Cart reload after checkout failed");
        }

        report
    }
}
