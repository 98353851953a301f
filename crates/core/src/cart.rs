//! Shopping cart state and its transitions.
//!
//! The cart is a plain value: every change goes through [`Cart::apply`],
//! which recomputes the subtotal and item count afterwards so the derived
//! figures can never drift from the lines. The storefront keeps only
//! [`StoredCartLine`] pairs in the session and rebuilds a [`Cart`] from fresh
//! catalog data on every request.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Most units of one product a cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Product data a cart line needs to render and total itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub size: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub in_stock: bool,
}

/// One product and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: CartProduct,
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        Price::zar(self.product.price).times(self.quantity).amount
    }
}

/// The session form of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A state transition on the cart.
#[derive(Debug, Clone)]
pub enum CartAction {
    /// Increment the product's quantity, appending a line if it is new.
    /// The line saturates at [`MAX_LINE_QUANTITY`].
    Add { product: CartProduct, quantity: u32 },
    /// Drop the product's line.
    Remove { product_id: ProductId },
    /// Set the quantity, capped at [`MAX_LINE_QUANTITY`]. Zero or less
    /// removes the line.
    UpdateQuantity { product_id: ProductId, quantity: i64 },
    /// Empty the cart.
    Clear,
    /// Replace every line, e.g. when restoring from the session.
    Load { lines: Vec<CartLine> },
}

/// Cart contents with derived totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    total: Decimal,
    item_count: u32,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from existing lines.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        cart.apply(CartAction::Load { lines });
        cart
    }

    /// Apply a transition and recompute totals.
    pub fn apply(&mut self, action: CartAction) {
        match action {
            CartAction::Add { product, quantity } => {
                if quantity > 0 {
                    if let Some(line) = self.line_mut(&product.id) {
                        line.quantity = line
                            .quantity
                            .saturating_add(quantity)
                            .min(MAX_LINE_QUANTITY);
                    } else {
                        self.lines.push(CartLine {
                            product,
                            quantity: quantity.min(MAX_LINE_QUANTITY),
                        });
                    }
                }
            }
            CartAction::Remove { product_id } => {
                self.lines.retain(|line| line.product.id != product_id);
            }
            CartAction::UpdateQuantity {
                product_id,
                quantity,
            } => {
                if quantity <= 0 {
                    self.lines.retain(|line| line.product.id != product_id);
                } else if let Some(line) = self.line_mut(&product_id) {
                    line.quantity = u32::try_from(quantity)
                        .unwrap_or(MAX_LINE_QUANTITY)
                        .min(MAX_LINE_QUANTITY);
                }
            }
            CartAction::Clear => self.lines.clear(),
            CartAction::Load { lines } => {
                self.lines.clear();
                for line in lines {
                    self.apply(CartAction::Add {
                        product: line.product,
                        quantity: line.quantity,
                    });
                }
            }
        }
        self.recalculate();
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| &line.product.id == product_id)
    }

    fn recalculate(&mut self) {
        self.total = self.lines.iter().map(CartLine::line_total).sum();
        self.item_count = self
            .lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity));
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Sum of price times quantity over all lines.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        self.item_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of a product currently in the cart, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.lines
            .iter()
            .find(|line| &line.product.id == product_id)
            .map_or(0, |line| line.quantity)
    }

    /// The `(product_id, quantity)` pairs to keep in the session.
    #[must_use]
    pub fn to_stored(&self) -> Vec<StoredCartLine> {
        self.lines
            .iter()
            .map(|line| StoredCartLine {
                product_id: line.product.id.clone(),
                quantity: line.quantity,
            })
            .collect()
    }
}
