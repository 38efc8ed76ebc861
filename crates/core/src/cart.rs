//! Client-local shopping cart.
//!
//! The cart lives entirely in memory until checkout. Items are unique by
//! product id and always carry a quantity of at least one; setting a
//! quantity to zero or below removes the item instead.
//!
//! ```text
//!  add(product)              -> insert with qty 1, or qty += 1
//!  update_quantity(id, n<=0) -> remove(id)
//!  update_quantity(id, n>0)  -> qty = n          (no-op if id absent)
//!  remove(id)                -> drop entry       (no-op if id absent)
//!  clear()                   -> empty
//! ```
//!
//! Totals are recomputed on every read.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{OrderItemRequest, Product};
use crate::types::ProductId;

/// A product in the cart together with how many units were selected.
///
/// Serializes as the product's own fields plus `quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Product id of this line.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add one unit of `product`.
    ///
    /// Increments the quantity if the product is already in the cart,
    /// otherwise appends a new line with quantity 1. The product data
    /// captured on first add is kept for later increments.
    pub fn add(&mut self, product: &Product) {
        if let Some(item) = self.find_mut(product.id) {
            item.quantity = item.quantity.saturating_add(1);
            return;
        }

        self.items.push(CartItem {
            product: product.clone(),
            quantity: 1,
        });
    }

    /// Remove the line for `product_id`, if any.
    pub fn remove(&mut self, product_id: ProductId) {
        self.items.retain(|item| item.product.id != product_id);
    }

    /// Set the quantity for `product_id`.
    ///
    /// A quantity of zero or less removes the line. Unknown product ids are
    /// ignored. Quantities above `u32::MAX` are clamped to `u32::MAX`, the
    /// widest quantity an order line carries.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }

        if let Some(item) = self.find_mut(product_id) {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of price × quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Line for `product_id`, if present.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product.id == product_id)
    }

    /// Number of distinct products.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The `items` array of an order request for this cart.
    #[must_use]
    pub fn order_items(&self) -> Vec<OrderItemRequest> {
        self.items
            .iter()
            .map(|item| OrderItemRequest {
                product_id: item.product.id,
                quantity: item.quantity,
            })
            .collect()
    }

    fn find_mut(&mut self, product_id: ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| item.product.id == product_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn product(id: i64, price: i64) -> Product {
        Product::new(ProductId::new(id), format!("product-{id}"), Decimal::from(price))
    }

    #[test]
    fn test_add_inserts_then_increments() {
        let mut cart = Cart::new();
        cart.add(&product(1, 10));
        cart.add(&product(1, 10));
        cart.add(&product(2, 5));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 2);
        assert_eq!(cart.get(ProductId::new(2)).unwrap().quantity, 1);
    }

    #[test]
    fn test_totals_example() {
        // [{id:1, price:10, qty:2}, {id:2, price:5, qty:1}] -> total 25, count 3
        let mut cart = Cart::new();
        cart.add(&product(1, 10));
        cart.add(&product(1, 10));
        cart.add(&product(2, 5));

        assert_eq!(cart.total(), Decimal::from(25));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_empty_cart_totals() {
        let cart = Cart::new();
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decimal_prices_do_not_drift() {
        let mut cart = Cart::new();
        let mut mug = product(1, 0);
        mug.price = Decimal::new(1999, 2);
        cart.add(&mug);
        cart.update_quantity(mug.id, 3);

        assert_eq!(cart.total(), Decimal::new(5997, 2));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add(&product(1, 10));
        cart.remove(ProductId::new(99));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_update_quantity_sets_value() {
        let mut cart = Cart::new();
        cart.add(&product(1, 10));
        cart.update_quantity(ProductId::new(1), 7);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 7);
        assert_eq!(cart.item_count(), 7);
    }

    #[test]
    fn test_update_quantity_clamps_to_u32() {
        let mut cart = Cart::new();
        cart.add(&product(1, 10));
        cart.update_quantity(ProductId::new(1), i64::MAX);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, u32::MAX);
        assert_eq!(cart.item_count(), u64::from(u32::MAX));
    }

    #[test]
    fn test_update_quantity_negative_removes() {
        let mut cart = Cart::new();
        cart.add(&product(1, 10));
        cart.update_quantity(ProductId::new(1), -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add(&product(1, 10));
        cart.update_quantity(ProductId::new(2), 4);
        assert_eq!(cart.len(), 1);
        assert!(cart.get(ProductId::new(2)).is_none());
    }

    #[test]
    fn test_first_added_product_data_is_kept() {
        let mut cart = Cart::new();
        cart.add(&product(1, 10));
        cart.add(&product(1, 12));

        let item = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(item.product.price, Decimal::from(10));
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(&product(1, 10));
        cart.add(&product(2, 10));
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_item_serializes_flat() {
        let mut cart = Cart::new();
        cart.add(&product(1, 10));

        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(value[0]["id"], json!(1));
        assert_eq!(value[0]["name"], json!("product-1"));
        assert_eq!(value[0]["quantity"], json!(1));

        let restored: Cart = serde_json::from_value(value).unwrap();
        assert_eq!(restored, cart);
    }

    proptest! {
        #[test]
        fn prop_one_entry_per_product_with_add_count(ids in prop::collection::vec(0i64..8, 0..64)) {
            let mut cart = Cart::new();
            let mut expected: HashMap<i64, u32> = HashMap::new();
            for id in &ids {
                cart.add(&product(*id, 3));
                *expected.entry(*id).or_default() += 1;
            }

            prop_assert_eq!(cart.len(), expected.len());
            for (id, count) in &expected {
                prop_assert_eq!(cart.get(ProductId::new(*id)).map(|i| i.quantity), Some(*count));
            }
        }

        #[test]
        fn prop_totals_match_lines(
            adds in prop::collection::vec((0i64..6, 0i64..500), 0..40),
            updates in prop::collection::vec((0i64..6, -2i64..20), 0..10),
        ) {
            let mut cart = Cart::new();
            for (id, price) in &adds {
                cart.add(&product(*id, *price));
            }
            for (id, qty) in &updates {
                cart.update_quantity(ProductId::new(*id), *qty);
            }

            let total: Decimal = cart
                .items()
                .iter()
                .map(|i| i.product.price * Decimal::from(i.quantity))
                .sum();
            let count: u64 = cart.items().iter().map(|i| u64::from(i.quantity)).sum();
            prop_assert_eq!(cart.total(), total);
            prop_assert_eq!(cart.item_count(), count);
            prop_assert!(cart.items().iter().all(|i| i.quantity >= 1));
        }

        #[test]
        fn prop_update_to_zero_equals_remove(
            ids in prop::collection::vec(0i64..6, 0..30),
            target in 0i64..6,
        ) {
            let mut updated = Cart::new();
            for id in &ids {
                updated.add(&product(*id, 1));
            }
            let mut removed = updated.clone();

            updated.update_quantity(ProductId::new(target), 0);
            removed.remove(ProductId::new(target));

            prop_assert_eq!(updated, removed);
        }
    }
}
