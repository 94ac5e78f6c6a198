//! Orders at `orders/{id}`.

use serde_json::json;
use tracing::{info, instrument};

use innovacart_core::order::{Order, sort_newest_first};
use innovacart_core::{OrderId, OrderStatus, UserId};

use super::now_millis;
use crate::database::RealtimeDatabase;
use crate::error::RepositoryError;
use crate::push_id::push_id;

const PATH: &str = "orders";

fn order_path(id: &OrderId) -> String {
    format!("{PATH}/{id}")
}

fn with_key((key, mut order): (String, Order)) -> Order {
    if order.id.is_empty() {
        order.id = OrderId::new(key);
    }
    order
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    db: RealtimeDatabase,
}

impl OrderRepository {
    #[must_use]
    pub const fn new(db: RealtimeDatabase) -> Self {
        Self { db }
    }

    /// Store a new order. Guest defaults fill a missing user, and the key and
    /// creation time are assigned here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    #[instrument(skip(self, order), fields(user_id = %order.user_id, items = order.items.len()))]
    pub async fn add(&self, mut order: Order) -> Result<Order, RepositoryError> {
        order.apply_guest_defaults();
        order.id = OrderId::new(push_id());
        order.created_at = now_millis();

        self.db.set(&order_path(&order.id), &order).await?;
        info!(order_id = %order.id, grand_total = %order.grand_total, "Order placed");
        Ok(order)
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .db
            .list::<Order>(PATH)
            .await?
            .into_iter()
            .map(with_key)
            .collect();
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    /// Orders placed by a user, newest first. An empty uid has no orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError> {
        if user_id.is_empty() || user_id.is_guest() {
            return Ok(Vec::new());
        }
        let mut orders: Vec<Order> = self
            .db
            .query_equal_to::<Order>(PATH, "userId", user_id.as_str())
            .await?
            .into_iter()
            .map(with_key)
            .collect();
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .db
            .get::<Order>(&order_path(id))
            .await?
            .map(|order| with_key((id.to_string(), order))))
    }

    /// An order that must exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when absent.
    pub async fn require(&self, id: &OrderId) -> Result<Order, RepositoryError> {
        self.get(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("order {id}")))
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        self.require(id).await?;
        self.db
            .update(
                &order_path(id),
                &json!({
                    "status": status.as_str(),
                    "updatedAt": now_millis().timestamp_millis(),
                }),
            )
            .await?;
        info!("Order status updated");
        Ok(())
    }

    /// Set or clear the courier tracking id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn update_tracking(&self, id: &OrderId, tracking_id: &str) -> Result<(), RepositoryError> {
        self.require(id).await?;
        let tracking_id = tracking_id.trim();
        let tracking = if tracking_id.is_empty() {
            serde_json::Value::Null
        } else {
            json!(tracking_id)
        };
        self.db
            .update(
                &order_path(id),
                &json!({
                    "trackingId": tracking,
                    "updatedAt": now_millis().timestamp_millis(),
                }),
            )
            .await?;
        info!("Order tracking updated");
        Ok(())
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete(&self, id: &OrderId) -> Result<(), RepositoryError> {
        self.db.remove(&order_path(id)).await?;
        info!("Order deleted");
        Ok(())
    }
}
