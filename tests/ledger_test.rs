mod common;

use commerce_core::AppError;
use commerce_core::entities::{Asset, DealType, balance_entity};
use commerce_core::models::DealQuery;
use common::setup;
use futures_util::future::join_all;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

#[tokio::test]
async fn credit_debit_and_overdraft() {
    let ctx = setup().await;
    let ledger = &ctx.ledger;

    let reward = ledger
        .record_transaction("alice", Asset::Money, 100, DealType::Reward, "", "signup bonus")
        .await
        .unwrap();
    assert_eq!(reward.balance, 100);

    let payment = ledger
        .record_transaction("alice", Asset::Money, -30, DealType::Payment, "order-1", "")
        .await
        .unwrap();
    assert_eq!(payment.balance, 70);
    assert_eq!(payment.related_id.as_deref(), Some("order-1"));
    assert!(payment.description.is_none());

    assert_eq!(ledger.get_balance("alice", Asset::Money).await.unwrap(), 70);

    assert!(matches!(
        ledger
            .record_transaction("alice", Asset::Money, -80, DealType::Payment, "order-2", "")
            .await,
        Err(AppError::InsufficientFunds)
    ));
    assert_eq!(ledger.get_balance("alice", Asset::Money).await.unwrap(), 70);

    let report = ledger.reconcile("alice", Asset::Money).await.unwrap();
    assert_eq!(report.deal_count, 2);
    assert_eq!(report.deal_sum, 70);
    assert_eq!(report.last_snapshot, Some(70));
    assert!(report.is_consistent());
}

#[tokio::test]
async fn absent_balance_reads_as_zero() {
    let ctx = setup().await;
    assert_eq!(ctx.ledger.get_balance("nobody", Asset::Money).await.unwrap(), 0);

    // 首次就扣款：懒创建的余额行随事务一起回滚
    assert!(matches!(
        ctx.ledger
            .record_transaction("nobody", Asset::Point, -1, DealType::Usage, "", "")
            .await,
        Err(AppError::InsufficientFunds)
    ));
    let rows = balance_entity::Entity::find()
        .filter(balance_entity::Column::UserId.eq("nobody"))
        .all(&ctx.db)
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert!(ctx.ledger.reconcile_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn assets_are_separate_accounts() {
    let ctx = setup().await;
    ctx.ledger
        .record_transaction("alice", Asset::Money, 50, DealType::Refund, "order-1", "")
        .await
        .unwrap();
    ctx.ledger
        .record_transaction("alice", Asset::Point, 500, DealType::Reward, "", "")
        .await
        .unwrap();

    assert_eq!(ctx.ledger.get_balance("alice", Asset::Money).await.unwrap(), 50);
    assert_eq!(ctx.ledger.get_balance("alice", Asset::Point).await.unwrap(), 500);
    assert!(matches!(
        ctx.ledger
            .record_transaction("alice", Asset::Money, -60, DealType::Payment, "", "")
            .await,
        Err(AppError::InsufficientFunds)
    ));
}

#[tokio::test]
async fn overflowing_credit_is_rejected() {
    let ctx = setup().await;
    ctx.ledger
        .record_transaction("alice", Asset::Point, i64::MAX, DealType::Reward, "", "")
        .await
        .unwrap();

    assert!(matches!(
        ctx.ledger
            .record_transaction("alice", Asset::Point, 1, DealType::Reward, "", "")
            .await,
        Err(AppError::ValidationError(_))
    ));
    assert_eq!(
        ctx.ledger.get_balance("alice", Asset::Point).await.unwrap(),
        i64::MAX
    );
    assert_eq!(
        ctx.ledger.reconcile("alice", Asset::Point).await.unwrap().deal_count,
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_debits_never_overdraw() {
    let ctx = setup().await;
    ctx.ledger
        .record_transaction("alice", Asset::Money, 100, DealType::Reward, "", "")
        .await
        .unwrap();

    let handles = (0..20).map(|i| {
        let ledger = ctx.ledger.clone();
        tokio::spawn(async move {
            ledger
                .record_transaction(
                    "alice",
                    Asset::Money,
                    -10,
                    DealType::Payment,
                    &format!("order-{i}"),
                    "",
                )
                .await
        })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 10);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(AppError::InsufficientFunds)))
            .count(),
        10
    );
    assert_eq!(ctx.ledger.get_balance("alice", Asset::Money).await.unwrap(), 0);

    let report = ctx.ledger.reconcile("alice", Asset::Money).await.unwrap();
    assert_eq!(report.deal_count, 11);
    assert!(report.is_consistent());
}

#[tokio::test]
async fn list_deals_newest_first() {
    let ctx = setup().await;
    for amount in [10, 20, 30] {
        ctx.ledger
            .record_transaction("alice", Asset::Money, amount, DealType::Reward, "", "")
            .await
            .unwrap();
    }
    ctx.ledger
        .record_transaction("alice", Asset::Point, 5, DealType::Reward, "", "")
        .await
        .unwrap();

    let all = ctx
        .ledger
        .list_deals("alice", DealQuery::default())
        .await
        .unwrap();
    assert_eq!(all.total, 4);
    assert_eq!(all.data[0].asset, Asset::Point);

    let money = ctx
        .ledger
        .list_deals(
            "alice",
            DealQuery {
                page: Some(1),
                page_size: Some(2),
                asset: Some(Asset::Money),
            },
        )
        .await
        .unwrap();
    assert_eq!(money.total, 3);
    assert_eq!(money.total_pages, 2);
    assert_eq!(money.data.len(), 2);
    assert_eq!(money.data[0].amount, 30);
    assert_eq!(money.data[0].balance, 60);
}

#[tokio::test]
async fn reconcile_all_detects_tampering() {
    let ctx = setup().await;
    ctx.ledger
        .record_transaction("alice", Asset::Money, 100, DealType::Reward, "", "")
        .await
        .unwrap();
    ctx.ledger
        .record_transaction("bob", Asset::Money, 40, DealType::Reward, "", "")
        .await
        .unwrap();
    assert!(ctx.ledger.reconcile_all().await.unwrap().is_empty());

    balance_entity::Entity::update_many()
        .col_expr(balance_entity::Column::Total, Expr::value(1_000_i64))
        .filter(balance_entity::Column::UserId.eq("bob"))
        .exec(&ctx.db)
        .await
        .unwrap();

    let mismatched = ctx.ledger.reconcile_all().await.unwrap();
    assert_eq!(mismatched.len(), 1);
    assert_eq!(mismatched[0].user_id, "bob");
    assert_eq!(mismatched[0].balance, 1_000);
    assert_eq!(mismatched[0].deal_sum, 40);
}
