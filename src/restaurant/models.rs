use axum_eats::schema::restaurants;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::pagination::Pagination;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";
pub const STATUS_SUSPENDED: &str = "suspended";

#[derive(Queryable, Selectable, Debug, PartialEq, Identifiable, Serialize)]
#[diesel(table_name=restaurants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Restaurant {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub description: String,
    pub cuisines: Vec<String>,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub lat: f64,
    pub lng: f64,
    pub delivery_fee: f64,
    pub minimum_order: f64,
    pub delivery_radius_km: f64,
    pub rating_average: f64,
    pub rating_count: i32,
    pub status: String,
    pub is_active: bool,
    pub is_open: bool,
    pub total_orders: i32,
    pub total_revenue: f64,
    pub created_at: DateTime<Utc>,
}

impl Restaurant {
    /// Whether customers may currently order from this restaurant.
    pub fn is_orderable(&self) -> bool {
        self.is_active && self.status == STATUS_APPROVED
    }
}

#[derive(Insertable)]
#[diesel(table_name = restaurants)]
pub struct NewRestaurant {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub description: String,
    pub cuisines: Vec<String>,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub lat: f64,
    pub lng: f64,
    pub delivery_fee: f64,
    pub minimum_order: f64,
    pub delivery_radius_km: f64,
    pub status: String,
}

#[derive(Deserialize, Validate)]
pub struct CreateRestaurantPayload {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 7, max = 20, message = "Please enter a valid phone number"))]
    pub phone: String,
    #[validate(length(
        min = 10,
        max = 500,
        message = "Description must be between 10 and 500 characters"
    ))]
    pub description: String,
    #[validate(length(min = 1, message = "At least one cuisine type is required"))]
    pub cuisines: Vec<String>,
    #[validate(length(min = 1, message = "Street address is required"))]
    pub street: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Zip code is required"))]
    pub zip_code: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub delivery_fee: f64,
    #[serde(default)]
    pub minimum_order: f64,
    #[serde(default = "default_radius")]
    pub delivery_radius_km: f64,
}

fn default_radius() -> f64 {
    5.0
}

#[derive(Deserialize, Validate, AsChangeset)]
#[diesel(table_name = restaurants)]
pub struct UpdateRestaurantPayload {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(length(
        min = 10,
        max = 500,
        message = "Description must be between 10 and 500 characters"
    ))]
    pub description: Option<String>,
    pub cuisines: Option<Vec<String>>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub delivery_fee: Option<f64>,
    pub minimum_order: Option<f64>,
    pub delivery_radius_km: Option<f64>,
    pub is_open: Option<bool>,
}

#[derive(Deserialize, Validate)]
pub struct SetStatusPayload {
    pub status: String,
}

#[derive(Deserialize, Debug)]
pub struct RestaurantFilters {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub cuisine: Option<String>,
    pub rating: Option<f64>,
    pub search: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
}

impl RestaurantFilters {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Great-circle distance in kilometers, used for the delivery-radius filter.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    #[test]
    fn filters_parse_from_query_string() {
        let uri: Uri =
            "/api/restaurants?page=2&limit=10&cuisine=Italian&rating=4.5&lat=40.7&lng=-74.0&radius=5"
                .parse()
                .unwrap();
        let Query(filters) = Query::<RestaurantFilters>::try_from_uri(&uri).unwrap();
        assert_eq!(filters.pagination().offset(), 10);
        assert_eq!(filters.cuisine.as_deref(), Some("Italian"));
        assert_eq!(filters.rating, Some(4.5));
        assert_eq!(filters.lat, Some(40.7));
        assert_eq!(filters.radius, Some(5.0));
    }

    #[test]
    fn bare_listing_request_uses_defaults() {
        let uri: Uri = "/api/restaurants".parse().unwrap();
        let Query(filters) = Query::<RestaurantFilters>::try_from_uri(&uri).unwrap();
        assert_eq!(filters.pagination().page(), 1);
        assert_eq!(filters.pagination().limit(), 10);
    }

    #[test]
    fn zero_distance_for_same_point() {
        assert!(distance_km(40.7128, -74.0060, 40.7128, -74.0060) < 1e-9);
    }

    #[test]
    fn known_city_pair_distance() {
        // New York -> Philadelphia, roughly 130 km.
        let d = distance_km(40.7128, -74.0060, 39.9526, -75.1652);
        assert!((d - 130.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn orderable_requires_active_and_approved() {
        let mut r = Restaurant {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Trattoria".into(),
            email: "t@example.com".into(),
            phone: "5551234".into(),
            description: "Neighborhood Italian kitchen".into(),
            cuisines: vec!["Italian".into()],
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62701".into(),
            lat: 0.0,
            lng: 0.0,
            delivery_fee: 2.0,
            minimum_order: 10.0,
            delivery_radius_km: 5.0,
            rating_average: 0.0,
            rating_count: 0,
            status: STATUS_APPROVED.into(),
            is_active: true,
            is_open: true,
            total_orders: 0,
            total_revenue: 0.0,
            created_at: Utc::now(),
        };
        assert!(r.is_orderable());

        r.status = STATUS_PENDING.into();
        assert!(!r.is_orderable());

        r.status = STATUS_APPROVED.into();
        r.is_active = false;
        assert!(!r.is_orderable());
    }
}
