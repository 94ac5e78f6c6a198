//! Orders placed at checkout.
//!
//! An order snapshots the cart lines, the customer's delivery details and the
//! mobile-payment reference they entered. Prices are copied at placement so
//! later catalog edits never change a past order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartItem};
use crate::catalog::Product;
use crate::coupon::Coupon;
use crate::delivery::{delivery_charge, is_known_district};
use crate::types::{Email, OrderId, OrderStatus, PaymentMethod, ProductId, UserId, VariantId, round_money};

/// Email stored on orders placed without an account.
pub const GUEST_EMAIL: &str = "guest@example.com";
/// Name stored on orders placed without an account.
pub const GUEST_NAME: &str = "Guest User";

/// Who placed the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

impl OrderUser {
    #[must_use]
    pub fn guest() -> Self {
        Self {
            id: UserId::guest(),
            email: GUEST_EMAIL.to_string(),
            name: GUEST_NAME.to_string(),
        }
    }
}

/// Variant snapshot on an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderVariant {
    pub id: VariantId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Product snapshot on an order line. `price` is the unit price charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<OrderVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: OrderProduct,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        round_money(self.product.price * Decimal::from(self.quantity))
    }
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        let unit_price = item.unit_price();
        Self {
            product: OrderProduct {
                id: item.product.id.clone(),
                name: item.product.name.clone(),
                price: unit_price,
                image: item.product.image.clone(),
                category: item.product.category.clone(),
                variant: item.selected_variant.as_ref().map(|v| OrderVariant {
                    id: v.id.clone(),
                    name: v.name.clone(),
                    price: unit_price,
                }),
            },
            quantity: item.quantity,
        }
    }
}

/// Delivery contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub district: String,
    pub address: String,
}

/// Mobile-payment reference entered by the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub transaction_id: String,
    pub last_three_digits: String,
    /// Shop number the customer was told to pay.
    #[serde(default)]
    pub payment_number: String,
}

/// Money figures of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub delivery_charge: Decimal,
    pub discount: Decimal,
    pub grand_total: Decimal,
}

impl OrderTotals {
    /// `subtotal + delivery - discount`, never below zero.
    #[must_use]
    pub fn compute(subtotal: Decimal, delivery_charge: Decimal, discount: Decimal) -> Self {
        let grand_total = (subtotal + delivery_charge - discount).max(Decimal::ZERO);
        Self {
            subtotal: round_money(subtotal),
            delivery_charge: round_money(delivery_charge),
            discount: round_money(discount),
            grand_total: round_money(grand_total),
        }
    }

    /// Totals for a cart shipped to `district` with an optional discount.
    #[must_use]
    pub fn for_cart(cart: &Cart, district: &str, discount: Decimal) -> Self {
        Self::compute(cart.total(), delivery_charge(district), discount)
    }
}

/// A stored order under `orders/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub id: OrderId,
    #[serde(default = "UserId::guest")]
    pub user_id: UserId,
    #[serde(default = "guest_email")]
    pub user_email: String,
    #[serde(default = "guest_name")]
    pub user_name: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Subtotal of the items.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub delivery_charge: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    #[serde(default)]
    pub customer_info: CustomerInfo,
    pub payment_info: PaymentInfo,
}

fn guest_email() -> String {
    GUEST_EMAIL.to_string()
}

fn guest_name() -> String {
    GUEST_NAME.to_string()
}

impl Order {
    /// Build a pending order from the cart. The id is assigned on save.
    #[must_use]
    pub fn from_cart(
        cart: &Cart,
        user: Option<OrderUser>,
        customer: CustomerInfo,
        payment: PaymentInfo,
        coupon: Option<(&Coupon, Decimal)>,
    ) -> Self {
        let user = user.unwrap_or_else(OrderUser::guest);
        let discount = coupon.map_or(Decimal::ZERO, |(_, amount)| amount);
        let totals = OrderTotals::for_cart(cart, &customer.district, discount);

        Self {
            id: OrderId::default(),
            user_id: user.id,
            user_email: user.email,
            user_name: user.name,
            items: cart.items.iter().map(OrderItem::from).collect(),
            total: totals.subtotal,
            delivery_charge: totals.delivery_charge,
            discount: totals.discount,
            coupon_code: coupon.map(|(c, _)| c.code.clone()),
            grand_total: totals.grand_total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
            tracking_id: None,
            customer_info: customer,
            payment_info: payment,
        }
    }

    /// Fill in guest identity for fields left blank.
    pub fn apply_guest_defaults(&mut self) {
        if self.user_id.is_empty() {
            self.user_id = UserId::guest();
        }
        if self.user_email.trim().is_empty() {
            self.user_email = guest_email();
        }
        if self.user_name.trim().is_empty() {
            self.user_name = guest_name();
        }
    }

    /// Amount charged. Orders stored without a grand total fall back to the subtotal.
    #[must_use]
    pub fn amount_due(&self) -> Decimal {
        if self.grand_total.is_zero() {
            self.total
        } else {
            self.grand_total
        }
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.user_id.is_guest()
    }

    /// Whether `user` may view this order.
    #[must_use]
    pub fn belongs_to(&self, user: &UserId) -> bool {
        !user.is_empty() && !self.is_guest() && &self.user_id == user
    }

    /// Short reference shown to customers (last eight key characters).
    #[must_use]
    pub fn short_id(&self) -> String {
        let id = self.id.as_str();
        let skip = id.chars().count().saturating_sub(8);
        id.chars().skip(skip).collect::<String>().to_uppercase()
    }
}

/// Sort orders newest first.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Orders with the given status, or all of them.
#[must_use]
pub fn filter_by_status(orders: Vec<Order>, status: Option<OrderStatus>) -> Vec<Order> {
    match status {
        Some(status) => orders.into_iter().filter(|o| o.status == status).collect(),
        None => orders,
    }
}

/// Why a checkout form was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please select a valid district")]
    UnknownDistrict,
    #[error("Enter the last three digits of the sending number")]
    InvalidLastThreeDigits,
    #[error("Your cart is empty")]
    EmptyCart,
}

/// Checkout form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub last_three_digits: String,
}

impl CheckoutForm {
    /// Check every required field.
    ///
    /// # Errors
    ///
    /// Returns the first `CheckoutError` in form order.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let required = [
            ("Name", &self.name),
            ("Email", &self.email),
            ("Phone", &self.phone),
            ("District", &self.district),
            ("Address", &self.address),
            ("Transaction ID", &self.transaction_id),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(CheckoutError::Missing(label));
            }
        }
        Email::parse(&self.email).map_err(|_| CheckoutError::InvalidEmail)?;
        if !is_known_district(&self.district) {
            return Err(CheckoutError::UnknownDistrict);
        }
        let digits = self.last_three_digits.trim();
        if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CheckoutError::InvalidLastThreeDigits);
        }
        Ok(())
    }

    /// Chosen payment method; unknown values fall back to bKash.
    #[must_use]
    pub fn method(&self) -> PaymentMethod {
        self.payment_method.parse().unwrap_or_default()
    }

    #[must_use]
    pub fn customer_info(&self) -> CustomerInfo {
        CustomerInfo {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            district: self.district.trim().to_string(),
            address: self.address.trim().to_string(),
        }
    }

    #[must_use]
    pub fn payment_info(&self, payment_number: &str) -> PaymentInfo {
        PaymentInfo {
            method: self.method(),
            transaction_id: self.transaction_id.trim().to_string(),
            last_three_digits: self.last_three_digits.trim().to_string(),
            payment_number: payment_number.to_string(),
        }
    }
}

/// Figures on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderStats {
    pub total_products: usize,
    pub total_orders: usize,
    pub active_coupons: usize,
    pub revenue: Decimal,
    pub pending: usize,
    pub processing: usize,
    pub shipped: usize,
    pub delivered: usize,
}

impl OrderStats {
    #[must_use]
    pub fn from_orders(
        orders: &[Order],
        coupons: &[Coupon],
        products: &[Product],
        now: DateTime<Utc>,
    ) -> Self {
        let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count();
        Self {
            total_products: products.len(),
            total_orders: orders.len(),
            active_coupons: coupons.iter().filter(|c| c.is_live(now)).count(),
            revenue: round_money(orders.iter().map(Order::amount_due).sum()),
            pending: count(OrderStatus::Pending),
            processing: count(OrderStatus::Processing),
            shipped: count(OrderStatus::Shipped),
            delivered: count(OrderStatus::Delivered),
        }
    }

    #[must_use]
    pub const fn count(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Pending => self.pending,
            OrderStatus::Processing => self.processing,
            OrderStatus::Shipped => self.shipped,
            OrderStatus::Delivered => self.delivered,
        }
    }
}

/// Sum of what a customer has paid across their orders.
#[must_use]
pub fn total_spent(orders: &[Order]) -> Decimal {
    round_money(orders.iter().map(Order::amount_due).sum())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::catalog::tests::{product, variant};
    use crate::types::DiscountType;
    use chrono::Duration;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: "Rahim".into(),
            email: "rahim@example.com".into(),
            phone: "01700000000".into(),
            district: "Dhaka".into(),
            address: "House 1, Road 2".into(),
            payment_method: "bKash".into(),
            transaction_id: "TX123".into(),
            last_three_digits: "789".into(),
        }
    }

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        let shirt = product("p1", "500", "t-shirts");
        cart.add(&shirt, 2, Some(&variant("xl", Some("550"), 3)));
        cart.add(&product("p2", "200", "fruits"), 1, None);
        cart
    }

    #[test]
    fn test_totals() {
        let t = OrderTotals::compute(d("1000"), d("60"), d("100"));
        assert_eq!(t.grand_total, d("960"));

        let floor = OrderTotals::compute(d("50"), d("0"), d("80"));
        assert_eq!(floor.grand_total, Decimal::ZERO);
    }

    #[test]
    fn test_from_cart_snapshots_variant_price() {
        let cart = sample_cart();
        let f = form();
        let order = Order::from_cart(&cart, None, f.customer_info(), f.payment_info("+880"), None);

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].product.price, d("550"));
        assert_eq!(order.items[0].product.variant.as_ref().unwrap().name, "XL");
        assert_eq!(order.total, d("1300"));
        assert_eq!(order.delivery_charge, d("60"));
        assert_eq!(order.grand_total, d("1360"));
        assert_eq!(order.user_id.as_str(), "guest");
        assert_eq!(order.user_email, GUEST_EMAIL);
        assert_eq!(order.user_name, GUEST_NAME);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_from_cart_with_coupon() {
        let cart = sample_cart();
        let coupon = Coupon::new(
            "TEN",
            d("10"),
            DiscountType::Percentage,
            5,
            Utc::now() + Duration::days(1),
        );
        let discount = coupon.apply(cart.total(), Utc::now()).unwrap();
        let mut f = form();
        f.district = "Sylhet".into();
        let user = OrderUser {
            id: UserId::new("uid-1"),
            email: "r@example.com".into(),
            name: "R".into(),
        };
        let order = Order::from_cart(
            &cart,
            Some(user),
            f.customer_info(),
            f.payment_info("+880"),
            Some((&coupon, discount)),
        );
        assert_eq!(order.discount, d("130"));
        assert_eq!(order.coupon_code.as_deref(), Some("TEN"));
        assert_eq!(order.grand_total, d("1290"));
        assert!(order.belongs_to(&UserId::new("uid-1")));
        assert!(!order.belongs_to(&UserId::new("uid-2")));
    }

    #[test]
    fn test_checkout_validation() {
        assert_eq!(form().validate(), Ok(()));

        let mut f = form();
        f.phone = " ".into();
        assert_eq!(f.validate(), Err(CheckoutError::Missing("Phone")));

        let mut f = form();
        f.email = "not-an-email".into();
        assert_eq!(f.validate(), Err(CheckoutError::InvalidEmail));

        let mut f = form();
        f.district = "Gotham".into();
        assert_eq!(f.validate(), Err(CheckoutError::UnknownDistrict));

        for bad in ["12", "1234", "12a", ""] {
            let mut f = form();
            f.last_three_digits = bad.into();
            assert_eq!(f.validate(), Err(CheckoutError::InvalidLastThreeDigits));
        }
    }

    #[test]
    fn test_stats() {
        let cart = sample_cart();
        let f = form();
        let mut orders = vec![
            Order::from_cart(&cart, None, f.customer_info(), f.payment_info(""), None),
            Order::from_cart(&cart, None, f.customer_info(), f.payment_info(""), None),
        ];
        orders[1].status = OrderStatus::Shipped;

        let now = Utc::now();
        let mut expired = Coupon::new("OLD", d("5"), DiscountType::Fixed, 1, now - Duration::days(1));
        let live = Coupon::new("NEW", d("5"), DiscountType::Fixed, 1, now + Duration::days(1));
        let stats = OrderStats::from_orders(&orders, &[live, expired.clone()], &[product("p", "1", "x")], now);
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_products, 1);
        assert_eq!(stats.active_coupons, 1);
        assert_eq!(stats.revenue, d("2720"));
        assert_eq!(stats.count(OrderStatus::Pending), 1);
        assert_eq!(stats.count(OrderStatus::Shipped), 1);

        expired.is_active = false;
        assert!(!expired.is_live(now));
    }

    #[test]
    fn test_sort_and_filter() {
        let cart = sample_cart();
        let f = form();
        let mut older = Order::from_cart(&cart, None, f.customer_info(), f.payment_info(""), None);
        older.created_at = Utc::now() - Duration::hours(2);
        older.id = OrderId::new("older");
        let mut newer = older.clone();
        newer.created_at = Utc::now();
        newer.id = OrderId::new("newer");
        newer.status = OrderStatus::Delivered;

        let mut orders = vec![older, newer];
        sort_newest_first(&mut orders);
        assert_eq!(orders[0].id.as_str(), "newer");

        let delivered = filter_by_status(orders.clone(), Some(OrderStatus::Delivered));
        assert_eq!(delivered.len(), 1);
        assert_eq!(filter_by_status(orders, None).len(), 2);
    }

    #[test]
    fn test_stored_order_without_user_fields() {
        let json = r#"{
            "id": "-Nxyz12345678",
            "items": [],
            "total": 500,
            "status": "processing",
            "createdAt": 1717000000000,
            "paymentInfo": {"method": "Nagad", "transactionId": "T", "lastThreeDigits": "123"}
        }"#;
        let mut order: Order = serde_json::from_str(json).unwrap();
        order.apply_guest_defaults();
        assert!(order.is_guest());
        assert_eq!(order.amount_due(), d("500"));
        assert_eq!(order.payment_info.method, PaymentMethod::Nagad);
        assert_eq!(order.short_id(), "12345678");
    }
}
