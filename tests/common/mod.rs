#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use commerce_core::entities::{CouponStatus, CouponType, coupon_entity};
use commerce_core::models::{NewCoupon, NewOrder, NewOrderItem, NewSku};
use commerce_core::services::{
    CouponService, InventoryService, LedgerService, OrderService, WriteOffService,
};
use commerce_core::{ManualClock, SharedClock};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;

pub struct TestContext {
    pub db: DatabaseConnection,
    pub clock: Arc<ManualClock>,
    pub orders: OrderService,
    pub inventory: InventoryService,
    pub coupons: CouponService,
    pub ledger: LedgerService,
    pub writeoff: WriteOffService,
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

/// In-memory SQLite with a single connection, so every transaction is
/// serialised through it the way row locks serialise them on Postgres.
pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect to sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn setup() -> TestContext {
    let db = setup_db().await;
    let clock = Arc::new(ManualClock::new(base_time()));
    let shared: SharedClock = clock.clone();

    let coupons = CouponService::new(db.clone(), shared.clone());
    TestContext {
        orders: OrderService::new(db.clone(), shared.clone()),
        inventory: InventoryService::new(db.clone(), shared.clone()),
        ledger: LedgerService::new(db.clone(), shared),
        writeoff: WriteOffService::new(coupons.clone()),
        coupons,
        clock,
        db,
    }
}

pub fn new_sku(stock: i32) -> NewSku {
    NewSku {
        product_id: "p-1".into(),
        code: Some("TEE-RED-L".into()),
        title: Some("Tee red L".into()),
        price: 1999,
        stock,
    }
}

pub fn new_order(user_id: &str, total: i64) -> NewOrder {
    NewOrder {
        user_id: user_id.into(),
        order_no: None,
        total_amount: total,
        pay_amount: total,
        discount: 0,
        address_snapshot: Some(r#"{"city":"Shanghai"}"#.into()),
        note: None,
    }
}

pub fn new_item(sku_id: &str, price: i64, quantity: i32) -> NewOrderItem {
    NewOrderItem {
        product_id: "p-1".into(),
        sku_id: sku_id.into(),
        title: "Tee".into(),
        sku_spec: Some("Color: Red, Size: L".into()),
        price,
        quantity,
    }
}

/// Cash coupon valid for one day either side of `base_time()`.
pub fn new_coupon(total_count: Option<i32>) -> NewCoupon {
    NewCoupon {
        title: "10 off 50".into(),
        description: None,
        coupon_type: CouponType::Cash,
        value: 10,
        min_spend: 50,
        start_time: base_time() - Duration::days(1),
        end_time: base_time() + Duration::days(1),
        total_count,
        status: CouponStatus::Enabled,
    }
}

pub async fn create_coupon(ctx: &TestContext, total_count: Option<i32>) -> coupon_entity::Model {
    ctx.coupons
        .create_coupon(new_coupon(total_count))
        .await
        .expect("create coupon")
}
