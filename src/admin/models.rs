use crate::auth::models::SafeUser;
use crate::order::models::Order;
use crate::utils::pagination::Pagination;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize)]
pub struct DashboardCounts {
    pub customers: i64,
    pub restaurants: i64,
    pub orders: i64,
    pub active_orders: i64,
    pub revenue: f64,
    pub pending_restaurants: i64,
}

#[derive(Serialize)]
pub struct Dashboard {
    pub counts: DashboardCounts,
    pub recent_users: Vec<SafeUser>,
    pub recent_orders: Vec<Order>,
}

#[derive(Deserialize)]
pub struct UserFilters {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub role: Option<String>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl UserFilters {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct SetUserStatusPayload {
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    #[test]
    fn user_filters_parse_from_query_string() {
        let uri: Uri = "/api/admin/users?page=3&limit=20&role=customer&is_active=false"
            .parse()
            .unwrap();
        let Query(filters) = Query::<UserFilters>::try_from_uri(&uri).unwrap();
        assert_eq!(filters.pagination().offset(), 40);
        assert_eq!(filters.role.as_deref(), Some("customer"));
        assert_eq!(filters.is_active, Some(false));
    }
}
