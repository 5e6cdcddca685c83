use axum_eats::schema::{order_events, orders};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::menu::models::Customization;

pub const PAYMENT_METHODS: [&str; 4] = ["Cash", "Card", "Digital Wallet", "Online Payment"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    PickedUp,
    OutForDelivery,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// In-flight statuses, i.e. everything before a terminal state.
    pub const ACTIVE: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::PickedUp,
        OrderStatus::OutForDelivery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "preparing" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "picked_up" => Some(OrderStatus::PickedUp),
            "out_for_delivery" => Some(OrderStatus::OutForDelivery),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }

    /// Position along the forward sequence; terminal side-exits have none.
    fn forward_rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::Ready => Some(3),
            OrderStatus::PickedUp => Some(4),
            OrderStatus::OutForDelivery => Some(5),
            OrderStatus::Delivered => Some(6),
            OrderStatus::Cancelled | OrderStatus::Refunded => None,
        }
    }

    /// Statuses only move forward along the sequence; `cancelled` and
    /// `refunded` are reachable from any non-terminal state.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            OrderStatus::Cancelled | OrderStatus::Refunded => true,
            _ => match (self.forward_rank(), next.forward_rank()) {
                (Some(cur), Some(nxt)) => nxt > cur,
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Delivery,
    Pickup,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Delivery => "delivery",
            OrderType::Pickup => "pickup",
        }
    }

    pub fn delivery_minutes(&self) -> i64 {
        match self {
            OrderType::Delivery => 45,
            OrderType::Pickup => 20,
        }
    }
}

/// Immutable snapshot of a purchased line: name and price are captured at
/// checkout so later menu edits cannot rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub customizations: Vec<Customization>,
    pub item_total: f64,
    pub special_instructions: Option<String>,
}

#[derive(Queryable, Selectable, Debug, PartialEq, Identifiable, Serialize)]
#[diesel(table_name=orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub items: Value,
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub service_fee: f64,
    pub tax: f64,
    pub discount: f64,
    pub total: f64,
    pub delivery_street: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub delivery_zip_code: String,
    pub delivery_instructions: Option<String>,
    pub contact_phone: String,
    pub contact_email: String,
    pub payment_method: String,
    pub payment_status: String,
    pub status: String,
    pub order_type: String,
    pub estimated_delivery_time: DateTime<Utc>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub special_instructions: Option<String>,
    pub cancellation_reason: Option<String>,
    pub rating_food: Option<i32>,
    pub rating_delivery: Option<i32>,
    pub rating_overall: Option<i32>,
    pub rating_comment: Option<String>,
    pub rated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn status(&self) -> Option<OrderStatus> {
        OrderStatus::parse(&self.status)
    }
}

#[derive(Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub items: Value,
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub service_fee: f64,
    pub tax: f64,
    pub discount: f64,
    pub total: f64,
    pub delivery_street: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub delivery_zip_code: String,
    pub delivery_instructions: Option<String>,
    pub contact_phone: String,
    pub contact_email: String,
    pub payment_method: String,
    pub payment_status: String,
    pub status: String,
    pub order_type: String,
    pub estimated_delivery_time: DateTime<Utc>,
    pub special_instructions: Option<String>,
}

#[derive(Queryable, Selectable, Debug, PartialEq, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(Order))]
#[diesel(table_name=order_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEvent {
    pub id: i32,
    pub order_id: Uuid,
    pub status: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = order_events)]
pub struct NewOrderEvent {
    pub order_id: Uuid,
    pub status: String,
    pub note: String,
}

/// Timestamp + sequence-derived suffix; the sequence never hands out the
/// same value twice, so same-millisecond checkouts get distinct numbers.
pub fn generate_order_number(now: DateTime<Utc>, sequence: i64) -> String {
    format!("ORD{}{:04}", now.timestamp_millis(), sequence % 10_000)
}

#[derive(Deserialize, Validate)]
pub struct CreateOrderPayload {
    pub restaurant: Uuid,
    #[validate(length(min = 1, message = "At least one item is required"), nested)]
    pub items: Vec<OrderLinePayload>,
    #[validate(nested)]
    pub delivery_address: DeliveryAddressPayload,
    #[validate(nested)]
    pub contact_info: ContactInfoPayload,
    pub payment_method: String,
    pub order_type: Option<OrderType>,
    pub special_instructions: Option<String>,
}

#[derive(Serialize, Deserialize, Validate)]
pub struct OrderLinePayload {
    pub menu_item: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[serde(default)]
    pub customizations: Vec<Customization>,
    pub special_instructions: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct DeliveryAddressPayload {
    #[validate(length(min = 1, message = "Street address is required"))]
    pub street: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Zip code is required"))]
    pub zip_code: String,
    pub instructions: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct ContactInfoPayload {
    #[validate(length(min = 7, max = 20, message = "Valid phone number is required"))]
    pub phone: String,
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateStatusPayload {
    pub status: String,
    pub note: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct CancelPayload {
    pub reason: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct RatePayload {
    #[validate(range(min = 1, max = 5, message = "Food rating must be between 1 and 5"))]
    pub food: i32,
    #[validate(range(min = 1, max = 5, message = "Delivery rating must be between 1 and 5"))]
    pub delivery: Option<i32>,
    #[validate(range(min = 1, max = 5, message = "Overall rating must be between 1 and 5"))]
    pub overall: i32,
    pub comment: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct OrderFilters {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub date: Option<chrono::NaiveDate>,
}

impl OrderFilters {
    pub fn pagination(&self) -> crate::utils::pagination::Pagination {
        crate::utils::pagination::Pagination {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub timeline: Vec<OrderEvent>,
}

/// Restaurant aggregate rating: mean of overall scores, one decimal place.
pub fn average_rating(overall_scores: &[i32]) -> f64 {
    if overall_scores.is_empty() {
        return 0.0;
    }
    let sum: i32 = overall_scores.iter().sum();
    let mean = f64::from(sum) / overall_scores.len() as f64;
    (mean * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    #[test]
    fn filters_parse_from_query_string() {
        let uri: Uri = "/api/orders?page=2&limit=10&status=pending&date=2026-08-01"
            .parse()
            .unwrap();
        let Query(filters) = Query::<OrderFilters>::try_from_uri(&uri).unwrap();
        assert_eq!(filters.pagination().offset(), 10);
        assert_eq!(filters.status.as_deref(), Some("pending"));
        assert_eq!(
            filters.date,
            chrono::NaiveDate::from_ymd_opt(2026, 8, 1)
        );
    }

    #[test]
    fn statuses_round_trip_through_storage_form() {
        for s in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::PickedUp,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            assert_eq!(OrderStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(OrderStatus::parse("lost"), None);
    }

    #[test]
    fn forward_transitions_only() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Delivered));
        assert!(Confirmed.can_transition_to(Preparing));
        assert!(PickedUp.can_transition_to(OutForDelivery));

        // No moving backwards.
        assert!(!Preparing.can_transition_to(Pending));
        assert!(!Preparing.can_transition_to(Confirmed));
        assert!(!Delivered.can_transition_to(OutForDelivery));
        // No self-transitions.
        assert!(!Preparing.can_transition_to(Preparing));
    }

    #[test]
    fn cancel_and_refund_from_non_terminal_only() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(OutForDelivery.can_transition_to(Cancelled));
        assert!(Ready.can_transition_to(Refunded));

        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Refunded));
        assert!(!Refunded.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states() {
        use OrderStatus::*;
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(Refunded.is_terminal());
        assert!(!OutForDelivery.is_terminal());
    }

    #[test]
    fn order_number_shape() {
        let now = Utc::now();
        let number = generate_order_number(now, 7);
        assert!(number.starts_with("ORD"));
        assert!(number.ends_with("0007"));
        assert_eq!(
            number.len(),
            3 + now.timestamp_millis().to_string().len() + 4
        );
    }

    #[test]
    fn same_millisecond_checkouts_get_distinct_numbers() {
        let now = Utc::now();
        let first = generate_order_number(now, 41);
        let second = generate_order_number(now, 42);
        assert_ne!(first, second);
    }

    #[test]
    fn average_rating_rounds_to_one_decimal() {
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[4]), 4.0);
        assert_eq!(average_rating(&[4, 5]), 4.5);
        assert_eq!(average_rating(&[3, 4, 4]), 3.7);
    }

    #[test]
    fn delivery_window_by_order_type() {
        assert_eq!(OrderType::Delivery.delivery_minutes(), 45);
        assert_eq!(OrderType::Pickup.delivery_minutes(), 20);
    }
}
