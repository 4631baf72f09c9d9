//! Order persistence and order-history queries.
//!
//! The repository writes to the remote document store when one is
//! configured and to local fallback storage otherwise. The choice is made
//! once, at construction; a failing remote call still drops through to the
//! local store so a shopper never loses an order to a flaky connection.

use crate::domain::aggregates::OrderRecord;
use crate::domain::ports::{Document, DocumentStore, FallbackStorage, StoreError};
use crate::domain::value_objects::Money;
use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Fallback key holding the most recent order, whoever placed it.
pub const LAST_ORDER_KEY: &str = "lastOrder";

pub fn orders_key(user_id: &str) -> String {
    format!("orders_{user_id}")
}

pub fn orders_collection(user_id: &str) -> String {
    format!("users/{user_id}/orders")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveOutcome {
    pub order_id: String,
    pub used_remote: bool,
}

/// Sort keys understood by the order history page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderSort {
    Newest,
    Oldest,
    Highest,
    Lowest,
    /// Keep the order the store returned.
    #[default]
    AsRetrieved,
}

impl From<&str> for OrderSort {
    fn from(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "newest" => Self::Newest,
            "oldest" => Self::Oldest,
            "highest" => Self::Highest,
            "lowest" => Self::Lowest,
            _ => Self::AsRetrieved,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Status to keep, compared case-insensitively. `None` or `"all"` keeps everything.
    pub status: Option<String>,
    pub sort: OrderSort,
}

impl OrderQuery {
    pub fn status(mut self, status: impl Into<String>) -> Self { self.status = Some(status.into()); self }
    pub fn sort(mut self, sort: impl Into<OrderSort>) -> Self { self.sort = sort.into(); self }

    fn apply(&self, mut orders: Vec<OrderRecord>) -> Vec<OrderRecord> {
        if let Some(wanted) = self.status.as_deref().map(str::trim).filter(|s| !s.eq_ignore_ascii_case("all")) {
            orders.retain(|o| o.status.as_str().eq_ignore_ascii_case(wanted));
        }
        match self.sort {
            OrderSort::Newest => orders.sort_by_key(|o| Reverse(o.created_at)),
            OrderSort::Oldest => orders.sort_by_key(|o| o.created_at),
            OrderSort::Highest => orders.sort_by_key(|o| Reverse(o.totals.total)),
            OrderSort::Lowest => orders.sort_by_key(|o| o.totals.total),
            OrderSort::AsRetrieved => {}
        }
        orders
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderStats {
    pub total_orders: usize,
    pub total_spent: Money,
    pub average_order: Money,
}

#[derive(Clone)]
pub struct OrderRepository {
    remote: Option<Arc<dyn DocumentStore>>,
    local: Arc<dyn FallbackStorage>,
}

impl OrderRepository {
    pub fn local_only(local: Arc<dyn FallbackStorage>) -> Self {
        Self { remote: None, local }
    }

    pub fn with_remote(remote: Arc<dyn DocumentStore>, local: Arc<dyn FallbackStorage>) -> Self {
        Self { remote: Some(remote), local }
    }

    pub fn uses_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Persists a new order and reports where it landed. Every call appends;
    /// there is no deduplication.
    #[instrument(skip(self, order), fields(user_id = %order.user_id, payment_intent_id = %order.payment_intent_id))]
    pub async fn save(&self, mut order: OrderRecord) -> Result<SaveOutcome, StoreError> {
        if let Some(remote) = &self.remote {
            match Self::save_remote(remote.as_ref(), &order).await {
                Ok(id) => {
                    order.id = id;
                    info!(order_id = %order.id, "order saved to remote store");
                    self.remember_last(&order).await;
                    return Ok(SaveOutcome { order_id: order.id, used_remote: true });
                }
                Err(e) => warn!(error = %e, "remote order write failed, falling back to local storage"),
            }
        }
        self.save_local(order).await
    }

    async fn save_remote(remote: &dyn DocumentStore, order: &OrderRecord) -> Result<String, StoreError> {
        let mut data = serde_json::to_value(order)?;
        if let Some(fields) = data.as_object_mut() {
            fields.remove("id");
        }
        remote.add(&orders_collection(&order.user_id), data).await
    }

    async fn save_local(&self, mut order: OrderRecord) -> Result<SaveOutcome, StoreError> {
        order.id = format!("order_{}", Uuid::new_v4().simple());
        let key = orders_key(&order.user_id);
        let mut orders = self.read_local(&key).await?;
        orders.insert(0, order.clone());
        self.local.set_item(&key, &serde_json::to_string(&orders)?).await?;
        info!(order_id = %order.id, "order saved to local storage");
        self.remember_last(&order).await;
        Ok(SaveOutcome { order_id: order.id, used_remote: false })
    }

    async fn remember_last(&self, order: &OrderRecord) {
        let result = match serde_json::to_string(order) {
            Ok(json) => self.local.set_item(LAST_ORDER_KEY, &json).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!(error = %e, "could not record last order");
        }
    }

    async fn read_local(&self, key: &str) -> Result<Vec<OrderRecord>, StoreError> {
        match self.local.get_item(key).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// All orders for a user, newest first, before any filtering.
    async fn fetch_all(&self, user_id: &str) -> Result<Vec<OrderRecord>, StoreError> {
        if let Some(remote) = &self.remote {
            match remote.list(&orders_collection(user_id)).await {
                Ok(docs) => {
                    let mut orders: Vec<OrderRecord> = docs.into_iter().filter_map(decode_document).collect();
                    orders.sort_by_key(|o| Reverse(o.created_at));
                    return Ok(orders);
                }
                Err(e) => warn!(error = %e, user_id, "remote order read failed, falling back to local storage"),
            }
        }
        self.read_local(&orders_key(user_id)).await
    }

    /// Order history with client-side filtering and sorting.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: &str, query: &OrderQuery) -> Result<Vec<OrderRecord>, StoreError> {
        let orders = self.fetch_all(user_id).await?;
        Ok(query.apply(orders))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, user_id: &str, order_id: &str) -> Result<Option<OrderRecord>, StoreError> {
        if let Some(remote) = &self.remote {
            match remote.get(&orders_collection(user_id), order_id).await {
                Ok(doc) => return Ok(doc.and_then(decode_document)),
                Err(e) => warn!(error = %e, "remote order lookup failed, falling back to local storage"),
            }
        }
        Ok(self.read_local(&orders_key(user_id)).await?.into_iter().find(|o| o.id == order_id))
    }

    pub async fn stats(&self, user_id: &str) -> Result<OrderStats, StoreError> {
        let orders = self.fetch_all(user_id).await?;
        let total_spent: Money = orders.iter().map(|o| o.totals.total).sum();
        let average_order = match orders.len() {
            0 => Money::ZERO,
            n => Money::new(total_spent.amount() / Decimal::from(n)),
        };
        Ok(OrderStats { total_orders: orders.len(), total_spent, average_order })
    }

    pub async fn last_order(&self) -> Result<Option<OrderRecord>, StoreError> {
        match self.local.get_item(LAST_ORDER_KEY).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

fn decode_document(doc: Document) -> Option<OrderRecord> {
    match serde_json::from_value::<OrderRecord>(doc.data) {
        Ok(mut order) => {
            order.id = doc.id;
            Some(order)
        }
        Err(e) => {
            warn!(document_id = %doc.id, error = %e, "skipping unreadable order document");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::tests::sample_order;
    use crate::domain::aggregates::OrderStatus;
    use crate::infrastructure::{InMemoryDocumentStore, InMemoryFallbackStorage};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn order(user: &str, total: Decimal, status: OrderStatus, age_minutes: i64) -> OrderRecord {
        let mut o = sample_order(user);
        o.totals.total = Money::new(total);
        o.status = status;
        o.created_at = Utc::now() - Duration::minutes(age_minutes);
        o
    }

    #[tokio::test]
    async fn test_local_save_prepends_and_records_last() {
        let local = Arc::new(InMemoryFallbackStorage::new());
        let repo = OrderRepository::local_only(local.clone());
        let first = repo.save(sample_order("u1")).await.unwrap();
        let second = repo.save(sample_order("u1")).await.unwrap();
        assert!(!first.used_remote);
        assert!(second.order_id.starts_with("order_"));

        let stored = repo.list("u1", &OrderQuery::default()).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, second.order_id);
        assert_eq!(repo.last_order().await.unwrap().unwrap().id, second.order_id);
    }

    #[tokio::test]
    async fn test_remote_save_strips_local_id() {
        let remote = Arc::new(InMemoryDocumentStore::new());
        let repo = OrderRepository::with_remote(remote.clone(), Arc::new(InMemoryFallbackStorage::new()));
        let outcome = repo.save(sample_order("u1")).await.unwrap();
        assert!(outcome.used_remote);
        let doc = remote.get("users/u1/orders", &outcome.order_id).await.unwrap().unwrap();
        assert!(doc.data.get("id").is_none());
        let fetched = repo.get("u1", &outcome.order_id).await.unwrap().unwrap();
        assert_eq!(fetched.id, outcome.order_id);
    }

    #[tokio::test]
    async fn test_filter_and_sort() {
        let repo = OrderRepository::local_only(Arc::new(InMemoryFallbackStorage::new()));
        repo.save(order("u1", dec!(30), OrderStatus::Shipped, 30)).await.unwrap();
        repo.save(order("u1", dec!(10), OrderStatus::Delivered, 20)).await.unwrap();
        repo.save(order("u1", dec!(50), OrderStatus::Shipped, 10)).await.unwrap();

        let shipped = repo.list("u1", &OrderQuery::default().status("SHIPPED")).await.unwrap();
        assert_eq!(shipped.len(), 2);
        assert!(shipped.iter().all(|o| o.status == OrderStatus::Shipped));

        let highest = repo.list("u1", &OrderQuery::default().sort("highest")).await.unwrap();
        let totals: Vec<Decimal> = highest.iter().map(|o| o.totals.total.amount()).collect();
        assert_eq!(totals, vec![dec!(50), dec!(30), dec!(10)]);

        let oldest = repo.list("u1", &OrderQuery::default().sort("oldest")).await.unwrap();
        assert_eq!(oldest[0].totals.total.amount(), dec!(30));

        let all = repo.list("u1", &OrderQuery::default().status("all").sort("bogus")).await.unwrap();
        let retrieved = repo.list("u1", &OrderQuery::default()).await.unwrap();
        assert_eq!(all, retrieved);
    }

    #[tokio::test]
    async fn test_newest_sort_reorders_out_of_sequence_saves() {
        let repo = OrderRepository::local_only(Arc::new(InMemoryFallbackStorage::new()));
        repo.save(order("u1", dec!(20), OrderStatus::Paid, 20)).await.unwrap();
        repo.save(order("u1", dec!(5), OrderStatus::Paid, 5)).await.unwrap();
        repo.save(order("u1", dec!(40), OrderStatus::Paid, 40)).await.unwrap();

        let retrieved = repo.list("u1", &OrderQuery::default()).await.unwrap();
        assert_eq!(retrieved[0].totals.total.amount(), dec!(40));

        let newest = repo.list("u1", &OrderQuery::default().sort("newest")).await.unwrap();
        assert!(newest.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        let totals: Vec<Decimal> = newest.iter().map(|o| o.totals.total.amount()).collect();
        assert_eq!(totals, vec![dec!(5), dec!(20), dec!(40)]);
    }

    #[tokio::test]
    async fn test_remote_history_is_newest_first() {
        let remote = Arc::new(InMemoryDocumentStore::new());
        let repo = OrderRepository::with_remote(remote.clone(), Arc::new(InMemoryFallbackStorage::new()));
        // The store returns documents in insertion order.
        repo.save(order("u1", dec!(30), OrderStatus::Paid, 30)).await.unwrap();
        repo.save(order("u1", dec!(60), OrderStatus::Paid, 60)).await.unwrap();
        repo.save(order("u1", dec!(5), OrderStatus::Paid, 5)).await.unwrap();

        assert_eq!(remote.len().await, 3);

        let history = repo.list("u1", &OrderQuery::default()).await.unwrap();
        assert!(history.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        let totals: Vec<Decimal> = history.iter().map(|o| o.totals.total.amount()).collect();
        assert_eq!(totals, vec![dec!(5), dec!(30), dec!(60)]);
    }

    #[tokio::test]
    async fn test_stats() {
        let repo = OrderRepository::local_only(Arc::new(InMemoryFallbackStorage::new()));
        assert_eq!(repo.stats("u1").await.unwrap().total_orders, 0);
        repo.save(order("u1", dec!(10), OrderStatus::Paid, 2)).await.unwrap();
        repo.save(order("u1", dec!(20), OrderStatus::Paid, 1)).await.unwrap();
        let stats = repo.stats("u1").await.unwrap();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_spent.amount(), dec!(30));
        assert_eq!(stats.average_order.amount(), dec!(15));
    }
}
