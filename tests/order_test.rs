mod common;

use commerce_core::AppError;
use commerce_core::entities::OrderStatus;
use commerce_core::models::{OrderPatch, OrderQuery};
use common::{new_item, new_order, setup};
use futures_util::future::join_all;
use sea_orm::ConnectionTrait;

#[tokio::test]
async fn create_persists_order_and_items() {
    let ctx = setup().await;
    let placed = ctx
        .orders
        .create(
            new_order("alice", 5000),
            vec![new_item("sku-1", 1000, 2), new_item("sku-2", 3000, 1)],
        )
        .await
        .unwrap();

    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.order_no.len(), 20);
    assert!(placed.order.order_no.starts_with("20261016120000"));
    assert_eq!(placed.items.len(), 2);
    assert_eq!(placed.items[0].amount, 2000);

    let stored = ctx.orders.get_order(&placed.order.id).await.unwrap();
    assert_eq!(stored, placed.order);
    let items = ctx.orders.get_items(&placed.order.id).await.unwrap();
    assert_eq!(items, placed.items);
}

#[tokio::test]
async fn create_keeps_caller_order_no() {
    let ctx = setup().await;
    let mut req = new_order("alice", 100);
    req.order_no = Some("EXT-0001".into());
    let placed = ctx
        .orders
        .create(req.clone(), vec![new_item("sku-1", 100, 1)])
        .await
        .unwrap();
    assert_eq!(placed.order.order_no, "EXT-0001");

    // 单号唯一，重复时整单不落库
    assert!(matches!(
        ctx.orders.create(req, vec![new_item("sku-1", 100, 1)]).await,
        Err(AppError::DatabaseError(_))
    ));
    let page = ctx
        .orders
        .list_user_orders("alice", OrderQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn item_insert_failure_rolls_back_order() {
    let ctx = setup().await;
    // 明细表缺失，明细写入必然失败
    ctx.db
        .execute_unprepared("DROP TABLE order_items")
        .await
        .unwrap();

    let result = ctx
        .orders
        .create(new_order("alice", 100), vec![new_item("sku-1", 100, 1)])
        .await;
    assert!(matches!(result, Err(AppError::DatabaseError(_))));

    let page = ctx
        .orders
        .list_user_orders("alice", OrderQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn create_validates_items() {
    let ctx = setup().await;
    assert!(matches!(
        ctx.orders.create(new_order("alice", 0), vec![]).await,
        Err(AppError::ValidationError(_))
    ));
    assert!(matches!(
        ctx.orders
            .create(new_order("alice", 100), vec![new_item("sku-1", 100, 0)])
            .await,
        Err(AppError::InvalidQuantity(0))
    ));
    let page = ctx
        .orders
        .list_user_orders("alice", OrderQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn happy_path_runs_in_order() {
    let ctx = setup().await;
    let placed = ctx
        .orders
        .create(new_order("alice", 100), vec![new_item("sku-1", 100, 1)])
        .await
        .unwrap();
    let id = placed.order.id;

    let paid = ctx.orders.pay(&id, "wallet", "tx-1").await.unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);
    assert_eq!(paid.pay_method.as_deref(), Some("wallet"));
    assert_eq!(paid.transaction_id.as_deref(), Some("tx-1"));

    assert_eq!(ctx.orders.ship(&id).await.unwrap().status, OrderStatus::Shipping);
    assert_eq!(ctx.orders.confirm(&id).await.unwrap().status, OrderStatus::Done);
}

#[tokio::test]
async fn guard_failures_report_from_and_to() {
    let ctx = setup().await;
    let id = ctx
        .orders
        .create(new_order("alice", 100), vec![new_item("sku-1", 100, 1)])
        .await
        .unwrap()
        .order
        .id;

    ctx.orders.pay(&id, "card", "tx-1").await.unwrap();
    assert!(matches!(
        ctx.orders.pay(&id, "card", "tx-2").await,
        Err(AppError::InvalidState {
            from: OrderStatus::Paid,
            to: OrderStatus::Paid
        })
    ));
    // 第二次支付不能覆盖原交易号
    let order = ctx.orders.get_order(&id).await.unwrap();
    assert_eq!(order.transaction_id.as_deref(), Some("tx-1"));

    ctx.orders.ship(&id).await.unwrap();
    assert!(matches!(
        ctx.orders.cancel(&id).await,
        Err(AppError::InvalidState {
            from: OrderStatus::Shipping,
            to: OrderStatus::Closed
        })
    ));
    assert!(matches!(
        ctx.orders.ship(&id).await,
        Err(AppError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn cancel_only_from_pending() {
    let ctx = setup().await;
    let id = ctx
        .orders
        .create(new_order("alice", 100), vec![new_item("sku-1", 100, 1)])
        .await
        .unwrap()
        .order
        .id;

    assert!(matches!(
        ctx.orders.confirm(&id).await,
        Err(AppError::InvalidState { .. })
    ));
    assert_eq!(ctx.orders.cancel(&id).await.unwrap().status, OrderStatus::Closed);
    assert!(matches!(
        ctx.orders.pay(&id, "card", "tx").await,
        Err(AppError::InvalidState {
            from: OrderStatus::Closed,
            to: OrderStatus::Paid
        })
    ));
    assert!(matches!(
        ctx.orders.pay("missing", "card", "tx").await,
        Err(AppError::OrderNotFound(_))
    ));
}

#[tokio::test]
async fn pay_with_patch_records_amount() {
    let ctx = setup().await;
    let id = ctx
        .orders
        .create(new_order("alice", 100), vec![new_item("sku-1", 100, 1)])
        .await
        .unwrap()
        .order
        .id;

    let paid = ctx
        .orders
        .pay_with(
            &id,
            OrderPatch::new()
                .pay_method("stripe")
                .transaction_id("pi_1")
                .pay_amount(90),
        )
        .await
        .unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);
    assert_eq!(paid.pay_amount, 90);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_pay_succeeds_once() {
    let ctx = setup().await;
    let id = ctx
        .orders
        .create(new_order("alice", 100), vec![new_item("sku-1", 100, 1)])
        .await
        .unwrap()
        .order
        .id;

    let handles = (0..5).map(|i| {
        let orders = ctx.orders.clone();
        let id = id.clone();
        tokio::spawn(async move { orders.pay(&id, "card", &format!("tx-{i}")).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(AppError::InvalidState { .. })))
            .count(),
        4
    );
}

#[tokio::test]
async fn list_user_orders_paginates_and_filters() {
    let ctx = setup().await;
    let mut ids = Vec::new();
    for _ in 0..5 {
        let placed = ctx
            .orders
            .create(new_order("alice", 100), vec![new_item("sku-1", 100, 1)])
            .await
            .unwrap();
        ids.push(placed.order.id);
    }
    ctx.orders
        .create(new_order("bob", 100), vec![new_item("sku-1", 100, 1)])
        .await
        .unwrap();
    ctx.orders.pay(&ids[0], "card", "tx").await.unwrap();

    let page = ctx
        .orders
        .list_user_orders(
            "alice",
            OrderQuery {
                page: Some(2),
                page_size: Some(2),
                status: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.data.len(), 2);

    let paid = ctx
        .orders
        .list_user_orders(
            "alice",
            OrderQuery {
                status: Some(OrderStatus::Paid),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(paid.total, 1);
    assert_eq!(paid.data[0].id, ids[0]);
}
