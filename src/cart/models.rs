use axum_eats::schema::{cart_items, carts};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::menu::models::Customization;

#[derive(Queryable, Selectable, Debug, PartialEq, Identifiable, Serialize)]
#[diesel(table_name=carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = carts)]
pub struct NewCart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Debug, PartialEq, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(Cart))]
#[diesel(table_name=cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub customizations: Value,
    pub special_instructions: Option<String>,
    pub added_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub customizations: Value,
    pub special_instructions: Option<String>,
}

/// What adding an item does to the existing cart state.
#[derive(Debug, PartialEq)]
pub enum AddDecision<'a> {
    /// Item comes from a different restaurant: empty the cart and rescope
    /// it before the new entry goes in.
    ClearAndRescope,
    /// Same item with a deeply-equal selection: bump the existing entry.
    MergeInto(&'a CartItem),
    /// New distinct line.
    Append,
}

/// A cart never holds items from two restaurants, and equal selections of
/// the same item collapse into one entry.
pub fn plan_addition<'a>(
    cart_restaurant_id: Uuid,
    item_restaurant_id: Uuid,
    entries: &'a [CartItem],
    menu_item_id: Uuid,
    selection: &Value,
) -> AddDecision<'a> {
    if cart_restaurant_id != item_restaurant_id {
        return AddDecision::ClearAndRescope;
    }
    entries
        .iter()
        .find(|e| e.menu_item_id == menu_item_id && &e.customizations == selection)
        .map_or(AddDecision::Append, AddDecision::MergeInto)
}

#[derive(Deserialize, Validate)]
pub struct AddToCartPayload {
    pub menu_item: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[serde(default)]
    pub customizations: Vec<Customization>,
    pub special_instructions: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct UpdateQuantityPayload {
    #[validate(range(min = 0, message = "Quantity must be a non-negative integer"))]
    pub quantity: i32,
}

/// Shape returned to clients: entries priced against the live menu items,
/// with cart-level totals recomputed from the surviving entries.
#[derive(Serialize)]
pub struct CartView {
    pub restaurant: Option<RestaurantSummary>,
    pub items: Vec<CartEntryView>,
    pub totals: CartTotals,
}

impl CartView {
    pub fn empty() -> Self {
        CartView {
            restaurant: None,
            items: Vec::new(),
            totals: CartTotals::default(),
        }
    }
}

#[derive(Serialize)]
pub struct RestaurantSummary {
    pub id: Uuid,
    pub name: String,
    pub delivery_fee: f64,
    pub minimum_order: f64,
}

#[derive(Serialize)]
pub struct CartEntryView {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub name: String,
    pub base_price: f64,
    pub quantity: i32,
    pub customizations: Value,
    pub special_instructions: Option<String>,
    pub unit_price: f64,
    pub line_total: f64,
}

#[derive(Serialize, Default, Debug, PartialEq)]
pub struct CartTotals {
    pub subtotal: f64,
    pub item_count: i32,
}

impl CartTotals {
    /// Totals are always derived from line entries, never trusted from storage.
    pub fn from_entries(entries: &[CartEntryView]) -> Self {
        CartTotals {
            subtotal: entries.iter().map(|e| e.line_total).sum(),
            item_count: entries.iter().map(|e| e.quantity).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(quantity: i32, unit_price: f64) -> CartEntryView {
        CartEntryView {
            id: Uuid::new_v4(),
            menu_item_id: Uuid::new_v4(),
            name: "Margherita".into(),
            base_price: unit_price,
            quantity,
            customizations: json!([]),
            special_instructions: None,
            unit_price,
            line_total: unit_price * quantity as f64,
        }
    }

    #[test]
    fn totals_sum_over_entries() {
        let entries = vec![entry(2, 9.0), entry(1, 4.5)];
        let totals = CartTotals::from_entries(&entries);
        assert_eq!(totals.subtotal, 22.5);
        assert_eq!(totals.item_count, 3);
    }

    #[test]
    fn empty_cart_has_zero_totals() {
        assert_eq!(CartTotals::from_entries(&[]), CartTotals::default());
    }

    fn cart_item(menu_item_id: Uuid, customizations: Value) -> CartItem {
        CartItem {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            menu_item_id,
            quantity: 1,
            customizations,
            special_instructions: None,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn different_restaurant_clears_and_rescopes() {
        let item_id = Uuid::new_v4();
        let selection = json!([]);
        let entries = vec![cart_item(item_id, selection.clone())];

        // Even an otherwise mergeable entry cannot survive a restaurant switch.
        let decision = plan_addition(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &entries,
            item_id,
            &selection,
        );
        assert_eq!(decision, AddDecision::ClearAndRescope);
    }

    #[test]
    fn equal_selection_merges_into_existing_entry() {
        let restaurant_id = Uuid::new_v4();
        let item_id = Uuid::new_v4();
        let selection = json!([{"name": "Size", "selected_options": [{"name": "Large", "price": 2.0}]}]);
        let entries = vec![
            cart_item(Uuid::new_v4(), json!([])),
            cart_item(item_id, selection.clone()),
        ];

        let decision = plan_addition(restaurant_id, restaurant_id, &entries, item_id, &selection);
        assert_eq!(decision, AddDecision::MergeInto(&entries[1]));
    }

    #[test]
    fn different_selection_appends_a_new_line() {
        let restaurant_id = Uuid::new_v4();
        let item_id = Uuid::new_v4();
        let entries = vec![cart_item(
            item_id,
            json!([{"name": "Size", "selected_options": [{"name": "Large", "price": 2.0}]}]),
        )];

        let other_selection =
            json!([{"name": "Size", "selected_options": [{"name": "Small", "price": 0.0}]}]);
        let decision = plan_addition(
            restaurant_id,
            restaurant_id,
            &entries,
            item_id,
            &other_selection,
        );
        assert_eq!(decision, AddDecision::Append);

        // An empty cart always appends.
        assert_eq!(
            plan_addition(restaurant_id, restaurant_id, &[], item_id, &json!([])),
            AddDecision::Append
        );
    }
}
