use axum_eats::schema::menu_items;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::restaurant::models::Restaurant;

/// A named option group offered on a menu item ("Size", "Toppings", ...).
/// Selecting an option may add a price delta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionGroup {
    pub name: String,
    pub options: Vec<GroupOption>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multi_select: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupOption {
    pub name: String,
    #[serde(default)]
    pub price: f64,
}

/// A customer's selection against an option group. Stored on cart entries
/// and snapshotted onto order items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customization {
    pub name: String,
    #[serde(default)]
    pub selected_options: Vec<GroupOption>,
}

/// Sum of the price deltas carried by a selection.
pub fn customization_total(customizations: &[Customization]) -> f64 {
    customizations
        .iter()
        .flat_map(|c| c.selected_options.iter())
        .map(|o| o.price)
        .sum()
}

#[derive(Queryable, Selectable, Debug, PartialEq, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(Restaurant))]
#[diesel(table_name=menu_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MenuItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub image: Option<String>,
    pub is_available: bool,
    pub customizations: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = menu_items)]
pub struct NewMenuItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub image: Option<String>,
    pub is_available: bool,
    pub customizations: Value,
}

#[derive(Deserialize, Validate)]
pub struct CreateMenuItemPayload {
    pub restaurant: Uuid,
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(
        min = 10,
        max = 300,
        message = "Description must be between 10 and 300 characters"
    ))]
    pub description: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(range(min = 0.0, message = "Price must be a positive number"))]
    pub price: f64,
    pub image: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub customizations: Vec<OptionGroup>,
}

fn default_available() -> bool {
    true
}

#[derive(Deserialize, Validate)]
pub struct UpdateMenuItemPayload {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(
        min = 10,
        max = 300,
        message = "Description must be between 10 and 300 characters"
    ))]
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0.0, message = "Price must be a positive number"))]
    pub price: Option<f64>,
    pub image: Option<String>,
    pub is_available: Option<bool>,
    pub customizations: Option<Vec<OptionGroup>>,
}

/// Storage-side changeset; built from the validated payload so the jsonb
/// column receives an already-serialized value.
#[derive(AsChangeset)]
#[diesel(table_name = menu_items)]
pub struct MenuItemChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub is_available: Option<bool>,
    pub customizations: Option<Value>,
}

impl From<UpdateMenuItemPayload> for MenuItemChanges {
    fn from(p: UpdateMenuItemPayload) -> Self {
        MenuItemChanges {
            name: p.name,
            description: p.description,
            category: p.category,
            price: p.price,
            image: p.image,
            is_available: p.is_available,
            customizations: p
                .customizations
                .map(|groups| serde_json::to_value(groups).unwrap_or(Value::Array(vec![]))),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct MenuFilters {
    pub category: Option<String>,
    pub search: Option<String>,
    pub available: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customization_total_sums_option_deltas() {
        let selection = vec![
            Customization {
                name: "Size".into(),
                selected_options: vec![GroupOption {
                    name: "Large".into(),
                    price: 2.5,
                }],
            },
            Customization {
                name: "Toppings".into(),
                selected_options: vec![
                    GroupOption {
                        name: "Cheese".into(),
                        price: 1.0,
                    },
                    GroupOption {
                        name: "Basil".into(),
                        price: 0.0,
                    },
                ],
            },
        ];
        assert_eq!(customization_total(&selection), 3.5);
        assert_eq!(customization_total(&[]), 0.0);
    }

    #[test]
    fn option_group_json_shape_is_stable() {
        let group = OptionGroup {
            name: "Size".into(),
            options: vec![GroupOption {
                name: "Large".into(),
                price: 2.0,
            }],
            required: false,
            multi_select: false,
        };
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["name"], "Size");
        assert_eq!(value["options"][0]["price"], 2.0);
        let back: OptionGroup = serde_json::from_value(value).unwrap();
        assert_eq!(back, group);
    }
}
