//! In-memory shopping cart for the checkout screen.

use thiserror::Error;

/// Amount in minor units (cents).
pub type Minor = u64;

/// Render minor units as the decimal string the backend expects, e.g. `"1800.00"`.
pub fn format_minor(amount: Minor) -> String {
    format!("{}.{:02}", amount / 100, amount % 100)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartItem {
    pub id: u32,
    pub name: String,
    pub unit_price: Minor,
    pub quantity: u32,
    pub icon: String,
}

impl CartItem {
    pub fn new(id: u32, name: &str, unit_price: Minor, icon: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            unit_price,
            quantity: 1,
            icon: icon.to_string(),
        }
    }

    pub fn line_total(&self) -> Minor {
        self.unit_price * Minor::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    QuantityBelowOne,
    #[error("no item with id {0}")]
    UnknownItem(u32),
    #[error("Your cart is empty!")]
    Empty,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Default for Cart {
    fn default() -> Self {
        Self {
            items: vec![
                CartItem::new(1, "Laptop", 100_000, "💻"),
                CartItem::new(2, "Phone", 50_000, "📱"),
                CartItem::new(3, "Tablet", 30_000, "📱"),
            ],
        }
    }
}

impl Cart {
    pub fn new(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn set_quantity(&mut self, id: u32, quantity: u32) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::QuantityBelowOne);
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(CartError::UnknownItem(id))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Adjust a quantity by `delta`; going below one is rejected and leaves the cart unchanged.
    pub fn adjust(&mut self, id: u32, delta: i32) -> Result<(), CartError> {
        let current = self
            .items
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.quantity)
            .ok_or(CartError::UnknownItem(id))?;
        let next = i64::from(current) + i64::from(delta);
        if next < 1 {
            return Err(CartError::QuantityBelowOne);
        }
        self.set_quantity(id, u32::try_from(next).unwrap_or(u32::MAX))
    }

    pub fn remove(&mut self, id: u32) {
        self.items.retain(|item| item.id != id);
    }

    pub fn total(&self) -> Minor {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Amount handed to the payment screen.
    pub fn checkout_amount(&self) -> Result<String, CartError> {
        if self.is_empty() {
            return Err(CartError::Empty);
        }
        Ok(format_minor(self.total()))
    }
}
