//! Pure pricing arithmetic shared by the cart read path and order creation.

pub const SERVICE_FEE_RATE: f64 = 0.05;
pub const TAX_RATE: f64 = 0.08;

/// Unit price of an item: base price plus the selected option deltas.
pub fn effective_price(base_price: f64, customization_delta: f64) -> f64 {
    base_price + customization_delta
}

pub fn line_total(unit_price: f64, quantity: i32) -> f64 {
    unit_price * quantity as f64
}

/// Service fee is rounded to the nearest whole amount.
pub fn service_fee(subtotal: f64) -> f64 {
    (subtotal * SERVICE_FEE_RATE).round()
}

/// Tax is rounded to the nearest whole amount.
pub fn tax(subtotal: f64) -> f64 {
    (subtotal * TAX_RATE).round()
}

pub fn order_total(subtotal: f64, delivery_fee: f64) -> f64 {
    subtotal + delivery_fee + service_fee(subtotal) + tax(subtotal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_price_adds_option_deltas() {
        assert_eq!(effective_price(9.0, 0.0), 9.0);
        assert_eq!(effective_price(9.0, 2.5), 11.5);
    }

    #[test]
    fn line_total_scales_by_quantity() {
        assert_eq!(line_total(11.5, 3), 34.5);
        assert_eq!(line_total(9.0, 0), 0.0);
    }

    #[test]
    fn fees_round_to_whole_amounts() {
        // subtotal 18.00: service 0.90 -> 1, tax 1.44 -> 1
        assert_eq!(service_fee(18.0), 1.0);
        assert_eq!(tax(18.0), 1.0);
        // subtotal 50.00: service 2.50 -> rounds up (half away from zero)
        assert_eq!(service_fee(50.0), 3.0);
        assert_eq!(tax(50.0), 4.0);
        assert_eq!(service_fee(0.0), 0.0);
        assert_eq!(tax(0.0), 0.0);
    }

    #[test]
    fn worked_delivery_example() {
        // 2 x 9.00 with a 2.00 delivery fee, as in the checkout flow.
        let subtotal = line_total(effective_price(9.0, 0.0), 2);
        assert_eq!(subtotal, 18.0);
        assert_eq!(order_total(subtotal, 2.0), 22.0);
    }

    #[test]
    fn pickup_orders_skip_delivery_fee() {
        assert_eq!(order_total(18.0, 0.0), 20.0);
    }
}
