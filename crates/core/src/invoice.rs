//! Printable invoice for an order.
//!
//! Both binaries render the same figures; this module turns an [`Order`] into
//! display strings so the templates stay free of arithmetic.

use crate::order::Order;
use crate::types::format_taka;

/// Trading name printed in the invoice header.
pub const COMPANY_NAME: &str = "InnovaCart";

/// Tagline under the company name.
pub const COMPANY_TAGLINE: &str = "Premium IT Solutions & E-commerce";

/// One row of the items table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLine {
    pub name: String,
    pub variant: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Display-ready invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub reference: String,
    pub date: String,
    pub status: String,
    pub status_class: String,
    pub tracking_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub district: String,
    pub address: String,
    pub payment_method: String,
    pub payment_number: String,
    pub transaction_id: String,
    pub last_three_digits: String,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: String,
    pub delivery_charge: String,
    pub discount: Option<String>,
    pub coupon_code: Option<String>,
    pub grand_total: String,
}

impl From<&Order> for Invoice {
    fn from(order: &Order) -> Self {
        let customer = &order.customer_info;
        let payment = &order.payment_info;
        let discount =
            (!order.discount.is_zero()).then(|| format!("-{}", format_taka(order.discount)));

        Self {
            reference: order.short_id(),
            date: order.created_at.format("%b %d, %Y").to_string(),
            status: order.status.label().to_string(),
            status_class: order.status.badge_class().to_string(),
            tracking_id: order.tracking_id.clone().filter(|t| !t.trim().is_empty()),
            customer_name: customer.name.clone(),
            customer_email: customer.email.clone(),
            customer_phone: customer.phone.clone(),
            district: if customer.district.trim().is_empty() {
                "N/A".to_string()
            } else {
                customer.district.clone()
            },
            address: customer.address.clone(),
            payment_method: payment.method.as_str().to_uppercase(),
            payment_number: payment.payment_number.clone(),
            transaction_id: payment.transaction_id.clone(),
            last_three_digits: payment.last_three_digits.clone(),
            lines: order
                .items
                .iter()
                .map(|item| InvoiceLine {
                    name: item.product.name.clone(),
                    variant: item.product.variant.as_ref().map(|v| v.name.clone()),
                    quantity: item.quantity,
                    unit_price: format_taka(item.product.price),
                    line_total: format_taka(item.line_total()),
                })
                .collect(),
            subtotal: format_taka(order.total),
            delivery_charge: format_taka(order.delivery_charge),
            discount,
            coupon_code: order.coupon_code.clone(),
            grand_total: format_taka(order.amount_due()),
        }
    }
}
