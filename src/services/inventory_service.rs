use crate::clock::SharedClock;
use crate::entities::{StockChangeType, sku_entity as skus, stock_log_entity as logs};
use crate::error::{AppError, AppResult};
use crate::models::{NewSku, StockAudit};
use crate::utils::new_id;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, UpdateResult,
};

/// 库存服务
///
/// 扣减采用条件更新 (`UPDATE ... WHERE stock >= ?`) 而不是先加锁再检查：
/// 并发扣减在数据库写路径上串行化，守卫条件是唯一的正确性保证。
#[derive(Clone)]
pub struct InventoryService {
    pool: DatabaseConnection,
    clock: SharedClock,
}

struct StockMovement<'a> {
    sku_id: &'a str,
    order_id: Option<&'a str>,
    quantity: i32,
    change_type: StockChangeType,
    stock_after: i32,
    reason: Option<&'a str>,
}

impl InventoryService {
    pub fn new(pool: DatabaseConnection, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    /// Creates a SKU. A positive initial stock is logged as an `admin` movement
    /// so the log alone can reproduce the counter.
    pub async fn create_sku(&self, req: NewSku) -> AppResult<skus::Model> {
        if req.stock < 0 {
            return Err(AppError::InvalidQuantity(req.stock));
        }
        if req.price < 0 {
            return Err(AppError::ValidationError("Price must not be negative".into()));
        }

        let now = self.clock.now();
        let txn = self.pool.begin().await?;

        let sku = skus::ActiveModel {
            id: Set(new_id()),
            product_id: Set(req.product_id),
            code: Set(req.code),
            title: Set(req.title),
            price: Set(req.price),
            stock: Set(req.stock),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        if sku.stock > 0 {
            append_log(
                &txn,
                now,
                StockMovement {
                    sku_id: &sku.id,
                    order_id: None,
                    quantity: sku.stock,
                    change_type: StockChangeType::Admin,
                    stock_after: sku.stock,
                    reason: Some("initial stock"),
                },
            )
            .await?;
        }

        txn.commit().await?;
        Ok(sku)
    }

    pub async fn deduct(&self, sku_id: &str, qty: i32, order_id: &str) -> AppResult<logs::Model> {
        self.deduct_in(&self.pool, sku_id, qty, order_id).await
    }

    /// 扣减库存。库存不足与 SKU 不存在都返回 `InsufficientStock`。
    pub async fn deduct_in<C>(
        &self,
        conn: &C,
        sku_id: &str,
        qty: i32,
        order_id: &str,
    ) -> AppResult<logs::Model>
    where
        C: TransactionTrait,
    {
        if qty <= 0 {
            return Err(AppError::InvalidQuantity(qty));
        }

        let now = self.clock.now();
        let txn = conn.begin().await?;

        // UPDATE skus SET stock = stock - ? WHERE id = ? AND stock >= ?
        let res: UpdateResult = skus::Entity::update_many()
            .col_expr(skus::Column::Stock, Expr::col(skus::Column::Stock).sub(qty))
            .col_expr(skus::Column::UpdatedAt, Expr::value(now))
            .filter(skus::Column::Id.eq(sku_id))
            .filter(skus::Column::Stock.gte(qty))
            .exec(&txn)
            .await?;

        if res.rows_affected == 0 {
            log::warn!("Stock deduction rejected: sku={sku_id} qty={qty} order={order_id}");
            return Err(AppError::InsufficientStock);
        }

        let after = current_stock(&txn, sku_id).await?;
        let entry = append_log(
            &txn,
            now,
            StockMovement {
                sku_id,
                order_id: Some(order_id),
                quantity: -qty,
                change_type: StockChangeType::Order,
                stock_after: after,
                reason: None,
            },
        )
        .await?;

        txn.commit().await?;
        log::debug!("Stock deducted: sku={sku_id} qty={qty} after={after}");
        Ok(entry)
    }

    pub async fn restore(&self, sku_id: &str, qty: i32, order_id: &str) -> AppResult<logs::Model> {
        self.restore_in(&self.pool, sku_id, qty, order_id).await
    }

    /// 归还库存（取消订单）。不设上限，允许超过原始库存。
    pub async fn restore_in<C>(
        &self,
        conn: &C,
        sku_id: &str,
        qty: i32,
        order_id: &str,
    ) -> AppResult<logs::Model>
    where
        C: TransactionTrait,
    {
        self.increase_in(conn, sku_id, qty, order_id, StockChangeType::Cancel)
            .await
    }

    pub async fn return_stock(
        &self,
        sku_id: &str,
        qty: i32,
        order_id: &str,
    ) -> AppResult<logs::Model> {
        self.return_stock_in(&self.pool, sku_id, qty, order_id).await
    }

    /// Goods sent back after delivery. Same as `restore_in` but logged as `return`.
    pub async fn return_stock_in<C>(
        &self,
        conn: &C,
        sku_id: &str,
        qty: i32,
        order_id: &str,
    ) -> AppResult<logs::Model>
    where
        C: TransactionTrait,
    {
        self.increase_in(conn, sku_id, qty, order_id, StockChangeType::Return)
            .await
    }

    async fn increase_in<C>(
        &self,
        conn: &C,
        sku_id: &str,
        qty: i32,
        order_id: &str,
        change_type: StockChangeType,
    ) -> AppResult<logs::Model>
    where
        C: TransactionTrait,
    {
        if qty <= 0 {
            return Err(AppError::InvalidQuantity(qty));
        }

        let now = self.clock.now();
        let txn = conn.begin().await?;

        let res = skus::Entity::update_many()
            .col_expr(skus::Column::Stock, Expr::col(skus::Column::Stock).add(qty))
            .col_expr(skus::Column::UpdatedAt, Expr::value(now))
            .filter(skus::Column::Id.eq(sku_id))
            .exec(&txn)
            .await?;

        if res.rows_affected == 0 {
            return Err(AppError::SkuNotFound(sku_id.to_string()));
        }

        let after = current_stock(&txn, sku_id).await?;
        let entry = append_log(
            &txn,
            now,
            StockMovement {
                sku_id,
                order_id: Some(order_id),
                quantity: qty,
                change_type,
                stock_after: after,
                reason: None,
            },
        )
        .await?;

        txn.commit().await?;
        log::debug!("Stock increased ({change_type}): sku={sku_id} qty={qty} after={after}");
        Ok(entry)
    }

    pub async fn adjust(&self, sku_id: &str, delta: i32, reason: &str) -> AppResult<logs::Model> {
        self.adjust_in(&self.pool, sku_id, delta, reason).await
    }

    /// 后台手工调整库存，负数调整同样受 `stock >= -delta` 守卫
    pub async fn adjust_in<C>(
        &self,
        conn: &C,
        sku_id: &str,
        delta: i32,
        reason: &str,
    ) -> AppResult<logs::Model>
    where
        C: TransactionTrait,
    {
        if delta == 0 {
            return Err(AppError::InvalidQuantity(delta));
        }

        let now = self.clock.now();
        let txn = conn.begin().await?;

        let mut update = skus::Entity::update_many()
            .col_expr(skus::Column::Stock, Expr::col(skus::Column::Stock).add(delta))
            .col_expr(skus::Column::UpdatedAt, Expr::value(now))
            .filter(skus::Column::Id.eq(sku_id));
        if delta < 0 {
            update = update.filter(skus::Column::Stock.gte(-delta));
        }
        let res = update.exec(&txn).await?;

        if res.rows_affected == 0 {
            // 管理端调用频率低，这里区分不存在与库存不足
            let exists = skus::Entity::find_by_id(sku_id).one(&txn).await?.is_some();
            return Err(if exists {
                AppError::InsufficientStock
            } else {
                AppError::SkuNotFound(sku_id.to_string())
            });
        }

        let after = current_stock(&txn, sku_id).await?;
        let entry = append_log(
            &txn,
            now,
            StockMovement {
                sku_id,
                order_id: None,
                quantity: delta,
                change_type: StockChangeType::Admin,
                stock_after: after,
                reason: Some(reason),
            },
        )
        .await?;

        txn.commit().await?;
        log::info!("Stock adjusted by admin: sku={sku_id} delta={delta} after={after} reason={reason}");
        Ok(entry)
    }

    pub async fn get_stock(&self, sku_id: &str) -> AppResult<i32> {
        current_stock(&self.pool, sku_id).await
    }

    pub async fn get_sku(&self, sku_id: &str) -> AppResult<skus::Model> {
        skus::Entity::find_by_id(sku_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::SkuNotFound(sku_id.to_string()))
    }

    /// 按写入顺序返回某个 SKU 的全部流水
    pub async fn list_logs(&self, sku_id: &str) -> AppResult<Vec<logs::Model>> {
        let list = logs::Entity::find()
            .filter(logs::Column::SkuId.eq(sku_id))
            .order_by_asc(logs::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list)
    }

    pub async fn audit(&self, sku_id: &str) -> AppResult<StockAudit> {
        let stock = current_stock(&self.pool, sku_id).await?;
        let entries = self.list_logs(sku_id).await?;

        Ok(StockAudit {
            sku_id: sku_id.to_string(),
            stock,
            logged_total: entries.iter().map(|l| i64::from(l.quantity)).sum(),
            last_after: entries.last().map(|l| l.stock_after),
            log_count: entries.len() as u64,
        })
    }

    /// Audits every SKU and returns the ones whose counter drifted from the log.
    pub async fn audit_all(&self) -> AppResult<Vec<StockAudit>> {
        let ids: Vec<String> = skus::Entity::find()
            .select_only()
            .column(skus::Column::Id)
            .order_by_asc(skus::Column::Id)
            .into_tuple()
            .all(&self.pool)
            .await?;

        let mut drifted = Vec::new();
        for id in ids {
            let audit = self.audit(&id).await?;
            if !audit.is_consistent() {
                drifted.push(audit);
            }
        }
        Ok(drifted)
    }
}

async fn current_stock<C>(conn: &C, sku_id: &str) -> AppResult<i32>
where
    C: ConnectionTrait,
{
    skus::Entity::find_by_id(sku_id)
        .one(conn)
        .await?
        .map(|sku| sku.stock)
        .ok_or_else(|| AppError::SkuNotFound(sku_id.to_string()))
}

async fn append_log<C>(
    conn: &C,
    now: DateTime<Utc>,
    movement: StockMovement<'_>,
) -> AppResult<logs::Model>
where
    C: ConnectionTrait,
{
    let entry = logs::ActiveModel {
        sku_id: Set(movement.sku_id.to_string()),
        order_id: Set(movement.order_id.map(str::to_string)),
        quantity: Set(movement.quantity),
        change_type: Set(movement.change_type),
        stock_before: Set(movement.stock_after - movement.quantity),
        stock_after: Set(movement.stock_after),
        reason: Set(movement.reason.map(str::to_string)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(entry)
}
