//! Cart commands.
//!
//! Each command loads the cart first, applies the requested selection, and
//! writes the cart panel to `out`. Diagnostics go through `tracing` to stderr.

use std::io::Write;

use pickngo_cart::view::LoadOutcome;
use pickngo_cart::{CartError, CartResource, CartView, TransactionResource};
use pickngo_core::CartItemId;
use thiserror::Error;

/// Errors from the cart commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("Cart item {0} is not in the cart")]
    UnknownItem(CartItemId),

    #[error("{failed} of {requested} items could not be removed")]
    RemoveIncomplete { failed: usize, requested: usize },

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Which rows a command operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemSelection {
    All,
    Ids(Vec<CartItemId>),
}

/// Print the cart panel.
pub async fn list<C: CartResource, T>(
    view: &CartView<C, T>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    load(view).await?;
    writeln!(out, "{}", view.summary().await)?;
    Ok(())
}

/// Print the cart panel with the given rows checked.
pub async fn total<C: CartResource, T>(
    view: &CartView<C, T>,
    selection: ItemSelection,
    out: &mut impl Write,
) -> Result<(), CliError> {
    load(view).await?;
    select(view, &selection).await?;
    writeln!(out, "{}", view.summary().await)?;
    Ok(())
}

/// Delete rows one by one; every id is attempted.
pub async fn remove<C: CartResource, T>(
    view: &CartView<C, T>,
    ids: &[CartItemId],
    out: &mut impl Write,
) -> Result<(), CliError> {
    load(view).await?;

    let mut failed = 0;
    for &id in ids {
        match view.remove_item(id).await {
            Ok(_) => writeln!(out, "Removed #{id}")?,
            Err(e) => {
                tracing::error!(item_id = %id, error = %e, "Failed to remove item");
                failed += 1;
            }
        }
    }

    writeln!(out, "{}", view.summary().await)?;

    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::RemoveIncomplete {
            failed,
            requested: ids.len(),
        })
    }
}

/// Check out the given rows and print the notice the panel would show.
pub async fn checkout<C: CartResource, T: TransactionResource>(
    view: &CartView<C, T>,
    selection: ItemSelection,
    out: &mut impl Write,
) -> Result<(), CliError> {
    load(view).await?;
    select(view, &selection).await?;

    match view.checkout().await {
        Ok(receipt) => {
            for committed in &receipt.transactions {
                match committed.transaction {
                    Some(transaction) => {
                        writeln!(out, "#{} -> transaction {transaction}", committed.cart_item)?;
                    }
                    None => writeln!(out, "#{} -> transaction recorded", committed.cart_item)?,
                }
            }
            for failed in &receipt.deletion.failed {
                writeln!(out, "#{} was purchased but is still in the cart", failed.id)?;
            }
            writeln!(out, "{}", receipt.notice())?;
            writeln!(out, "{}", view.summary().await)?;
            Ok(())
        }
        Err(e) => {
            writeln!(out, "{}", e.notice())?;
            Err(CartError::from(e).into())
        }
    }
}

async fn load<C: CartResource, T>(view: &CartView<C, T>) -> Result<(), CliError> {
    match view.load().await? {
        LoadOutcome::Applied { count } => tracing::debug!(count, "Cart loaded"),
        LoadOutcome::Superseded => tracing::debug!("Cart load superseded"),
    }
    Ok(())
}

/// Check exactly the requested rows. Unknown ids are an error.
async fn select<C, T>(view: &CartView<C, T>, selection: &ItemSelection) -> Result<(), CliError> {
    match selection {
        ItemSelection::All => {
            if !view.all_selected().await {
                view.select_all().await;
            }
        }
        ItemSelection::Ids(ids) => {
            let items = view.items().await;
            for &id in ids {
                if !items.iter().any(|item| item.id == id) {
                    return Err(CliError::UnknownItem(id));
                }
                if !view.is_selected(id).await {
                    view.toggle_selection(id).await;
                }
            }
        }
    }
    Ok(())
}
