mod common;

use common::{cart_of, valid_form, GatewayScript, ScriptedGateway};
use rust_decimal_macros::dec;
use std::sync::Arc;
use storefront_checkout::application::{CheckoutOrchestrator, OrderQuery, OrderRepository, OrderSort, Storefront};
use storefront_checkout::config::AppConfig;
use storefront_checkout::domain::aggregates::Customer;
use storefront_checkout::domain::ports::FallbackStorage;
use storefront_checkout::domain::value_objects::Money;
use storefront_checkout::infrastructure::FileFallbackStorage;
use storefront_checkout::OrderStatus;

async fn place(orchestrator: &CheckoutOrchestrator, user: &str, price: Money) -> String {
    let mut cart = cart_of(&[("item", price, 1)]);
    orchestrator.checkout(&mut cart, &valid_form(), &Customer::new(user)).await.unwrap().order_id
}

#[tokio::test]
async fn test_file_backed_history_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileFallbackStorage::open(dir.path()).await.unwrap());
    let orchestrator =
        CheckoutOrchestrator::new(ScriptedGateway::new(GatewayScript::Succeed), OrderRepository::local_only(storage));

    let first = place(&orchestrator, "user-1", Money::new(dec!(10))).await;
    let second = place(&orchestrator, "user-1", Money::new(dec!(80))).await;
    place(&orchestrator, "someone-else", Money::new(dec!(5))).await;

    let reopened = Arc::new(FileFallbackStorage::open(dir.path()).await.unwrap());
    let raw = reopened.get_item("orders_user-1").await.unwrap().unwrap();
    assert!(raw.trim_start().starts_with('['));

    let orders = OrderRepository::local_only(reopened);
    let history = orders.list("user-1", &OrderQuery::default()).await.unwrap();
    let ids: Vec<_> = history.iter().map(|o| o.id.clone()).collect();
    assert_eq!(ids, vec![second.clone(), first.clone()]);
    assert_eq!(orders.last_order().await.unwrap().unwrap().user_id, "someone-else");
}

#[tokio::test]
async fn test_filter_sort_and_stats() {
    let orchestrator = CheckoutOrchestrator::new(
        ScriptedGateway::new(GatewayScript::Succeed),
        OrderRepository::local_only(Arc::new(storefront_checkout::infrastructure::InMemoryFallbackStorage::new())),
    );
    for price in [dec!(20), dec!(75), dec!(40)] {
        place(&orchestrator, "user-1", Money::new(price)).await;
    }
    let orders = orchestrator.orders();

    let highest = orders.list("user-1", &OrderQuery::default().sort("highest")).await.unwrap();
    let totals: Vec<_> = highest.iter().map(|o| o.totals.total).collect();
    assert!(totals.windows(2).all(|w| w[0] >= w[1]), "{totals:?}");
    assert_eq!(highest[0].totals.subtotal, Money::new(dec!(75)));

    let lowest = orders.list("user-1", &OrderQuery::default().sort(OrderSort::Lowest)).await.unwrap();
    assert_eq!(lowest[0].totals.subtotal, Money::new(dec!(20)));

    // Fresh orders are all paid.
    assert!(orders.list("user-1", &OrderQuery::default().status("SHIPPED")).await.unwrap().is_empty());
    assert_eq!(orders.list("user-1", &OrderQuery::default().status("Paid")).await.unwrap().len(), 3);
    assert_eq!(orders.list("user-1", &OrderQuery::default().status("all")).await.unwrap().len(), 3);
    assert!(highest.iter().all(|o| o.status == OrderStatus::Paid));

    let stats = orders.stats("user-1").await.unwrap();
    assert_eq!(stats.total_orders, 3);
    let spent: Money = highest.iter().map(|o| o.totals.total).sum();
    assert_eq!(stats.total_spent, spent);

    let again = orders.list("user-1", &OrderQuery::default().sort("highest")).await.unwrap();
    assert_eq!(again, highest);
}

#[tokio::test]
async fn test_storefront_without_project_id_stays_local() {
    let dir = tempfile::tempdir().unwrap();
    let fallback = dir.path().join("orders");
    let config = AppConfig::from_lookup(|key| match key {
        "FIREBASE_PROJECT_ID" => Some("your-project-id".to_string()),
        "FALLBACK_STORAGE_DIR" => Some(fallback.display().to_string()),
        "API_BASE_URL" => Some("http://127.0.0.1:9".to_string()),
        _ => None,
    })
    .unwrap();

    let storefront = Storefront::from_config(&config, reqwest::Client::new()).await.unwrap();

    assert!(!storefront.checkout.orders().uses_remote());
    assert!(fallback.is_dir());
}
