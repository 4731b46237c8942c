//! # Cart State
//!
//! Manages the current shopping cart.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Cashier Action           Cart Method            Cart State Change      │
//! │  ──────────────           ───────────            ─────────────────      │
//! │                                                                         │
//! │  Scan product ───────────► add_item() ─────────► items.push(item)      │
//! │                                                                         │
//! │  Change quantity ────────► update_quantity() ──► items[i].qty = n      │
//! │                                                                         │
//! │  Remove line ────────────► remove_item() ──────► items.remove(i)       │
//! │                                                                         │
//! │  Checkout finalized ─────► clear() ────────────► items.clear()         │
//! │                                                                         │
//! │  NOTE: All write operations acquire the Mutex lock exclusively.         │
//! │        It is never held across an await.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use cajero_core::validation::{validate_cart_size, validate_price_cents, validate_quantity};
use cajero_core::{
    compute_totals, LineItem, Money, Product, TaxBreakdown, TaxCategory, UnitCode,
    ValidationError, MAX_ITEM_QUANTITY,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An item in the shopping cart.
///
/// Name, price and tax category are frozen when the product is added, so a
/// catalogue edit does not change a sale in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    /// Tax-inclusive unit price in céntimos.
    pub unit_price_cents: i64,
    pub tax_category: TaxCategory,
    pub unit_code: UnitCode,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            tax_category: product.tax_category,
            unit_code: product.unit_code,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Unit price × quantity, tax included.
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    pub fn to_line(&self) -> LineItem {
        LineItem {
            product_id: self.product_id.clone(),
            description: self.name.clone(),
            unit_price: Money::from_cents(self.unit_price_cents),
            quantity: self.quantity,
            tax_category: self.tax_category,
            unit_code: self.unit_code,
        }
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product increases quantity)
/// - Quantity is within `1..=MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_ITEMS` distinct lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a product, or increases its quantity if already present.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> Result<(), ValidationError> {
        validate_quantity(quantity)?;
        validate_price_cents(product.price_cents)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(ValidationError::OutOfRange {
                    field: format!("quantity of {}", product.name),
                    min: 1,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        validate_cart_size(self.items.len())?;
        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of a line. Zero removes it.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> Result<(), ValidationError> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        validate_quantity(quantity)?;

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| not_in_cart(product_id))?;
        item.quantity = quantity;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> Result<(), ValidationError> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(not_in_cart(product_id))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Snapshot of the cart as document lines, in insertion order.
    pub fn lines(&self) -> Vec<LineItem> {
        self.items.iter().map(CartItem::to_line).collect()
    }

    /// Exact fiscal breakdown of the current cart.
    pub fn totals(&self) -> TaxBreakdown {
        compute_totals(&self.lines())
    }
}

fn not_in_cart(product_id: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: "product".to_string(),
        reason: format!("{product_id} is not in the cart"),
    }
}

/// Cart totals summary for display, rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub breakdown: TaxBreakdown,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            breakdown: cart.totals().rounded(),
        }
    }
}

/// Shared cart.
///
/// `Arc<Mutex<Cart>>`: the orchestrator reads the cart at the start of a
/// checkout and clears it at the end, from another task.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        // Every mutation leaves the cart consistent, so a poisoned lock is usable.
        self.cart.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_cart(|cart| CartTotals::from(cart));
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        f(&self.lock())
    }

    /// Executes a function with write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| cart.add_item(&product, 1))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        f(&mut self.lock())
    }
}
