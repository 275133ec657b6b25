use crate::clock::SharedClock;
use crate::entities::{Asset, DealType, balance_entity as balances, deal_entity as deals};
use crate::error::{AppError, AppResult};
use crate::models::{DealQuery, PaginatedResponse, PaginationParams, ReconciliationReport};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// 钱包账本
///
/// 余额与流水 (deal) 在同一事务内写入，流水上的 `balance` 是写入后的余额快照，
/// 对账时 `Σ deal.amount == balance.total`。
#[derive(Clone)]
pub struct LedgerService {
    pool: DatabaseConnection,
    clock: SharedClock,
}

impl LedgerService {
    pub fn new(pool: DatabaseConnection, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    pub async fn record_transaction(
        &self,
        user_id: &str,
        asset: Asset,
        amount: i64,
        deal_type: DealType,
        related_id: &str,
        description: &str,
    ) -> AppResult<deals::Model> {
        self.record_transaction_in(
            &self.pool,
            user_id,
            asset,
            amount,
            deal_type,
            related_id,
            description,
        )
        .await
    }

    /// 记一笔账。正数入账，负数扣款，扣到负数时整体回滚并返回 `InsufficientFunds`。
    #[allow(clippy::too_many_arguments)]
    pub async fn record_transaction_in<C>(
        &self,
        conn: &C,
        user_id: &str,
        asset: Asset,
        amount: i64,
        deal_type: DealType,
        related_id: &str,
        description: &str,
    ) -> AppResult<deals::Model>
    where
        C: TransactionTrait,
    {
        if user_id.trim().is_empty() {
            return Err(AppError::ValidationError("Ledger user is required".into()));
        }

        let now = self.clock.now();
        let txn = conn.begin().await?;

        ensure_balance(&txn, user_id, asset, now).await?;

        // SELECT * FROM balances WHERE user_id = ? AND asset = ? FOR UPDATE
        let balance = balances::Entity::find()
            .filter(balances::Column::UserId.eq(user_id))
            .filter(balances::Column::Asset.eq(asset))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| {
                DbErr::RecordNotFound(format!("balance row for {user_id}/{asset} vanished"))
            })?;

        let new_total = balance
            .total
            .checked_add(amount)
            .ok_or_else(|| AppError::ValidationError("Amount overflows the balance".into()))?;
        if new_total < 0 {
            log::warn!(
                "Insufficient funds: user={user_id} asset={asset} total={} amount={amount}",
                balance.total
            );
            return Err(AppError::InsufficientFunds);
        }

        let mut am = balance.into_active_model();
        am.total = Set(new_total);
        am.updated_at = Set(now);
        am.update(&txn).await?;

        let deal = deals::ActiveModel {
            user_id: Set(user_id.to_string()),
            asset: Set(asset),
            deal_type: Set(deal_type),
            amount: Set(amount),
            balance: Set(new_total),
            related_id: Set(non_empty(related_id)),
            description: Set(non_empty(description)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        log::info!(
            "Ledger {deal_type}: user={user_id} asset={asset} amount={amount} balance={new_total}"
        );
        Ok(deal)
    }

    /// 没有记录视为余额为 0
    pub async fn get_balance(&self, user_id: &str, asset: Asset) -> AppResult<i64> {
        let balance = balances::Entity::find()
            .filter(balances::Column::UserId.eq(user_id))
            .filter(balances::Column::Asset.eq(asset))
            .one(&self.pool)
            .await?;
        Ok(balance.map_or(0, |b| b.total))
    }

    pub async fn list_deals(
        &self,
        user_id: &str,
        query: DealQuery,
    ) -> AppResult<PaginatedResponse<deals::Model>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select = deals::Entity::find().filter(deals::Column::UserId.eq(user_id));
        if let Some(asset) = query.asset {
            select = select.filter(deals::Column::Asset.eq(asset));
        }

        let total = select.clone().count(&self.pool).await?;
        let data = select
            .order_by_desc(deals::Column::Id)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(data, &params, total))
    }

    pub async fn reconcile(&self, user_id: &str, asset: Asset) -> AppResult<ReconciliationReport> {
        let balance = self.get_balance(user_id, asset).await?;

        // 在应用层求和，避免不同数据库 SUM 返回类型不一致
        let amounts: Vec<(i64, i64)> = deals::Entity::find()
            .select_only()
            .column(deals::Column::Amount)
            .column(deals::Column::Balance)
            .filter(deals::Column::UserId.eq(user_id))
            .filter(deals::Column::Asset.eq(asset))
            .order_by_asc(deals::Column::Id)
            .into_tuple()
            .all(&self.pool)
            .await?;

        Ok(ReconciliationReport {
            user_id: user_id.to_string(),
            asset,
            balance,
            deal_sum: amounts.iter().map(|(amount, _)| amount).sum(),
            last_snapshot: amounts.last().map(|(_, snapshot)| *snapshot),
            deal_count: amounts.len() as u64,
        })
    }

    /// 全量对账，只返回不一致的结果
    pub async fn reconcile_all(&self) -> AppResult<Vec<ReconciliationReport>> {
        let pairs: Vec<(String, Asset)> = balances::Entity::find()
            .select_only()
            .column(balances::Column::UserId)
            .column(balances::Column::Asset)
            .order_by_asc(balances::Column::Id)
            .into_tuple()
            .all(&self.pool)
            .await?;

        let mut mismatched = Vec::new();
        for (user_id, asset) in pairs {
            let report = self.reconcile(&user_id, asset).await?;
            if !report.is_consistent() {
                mismatched.push(report);
            }
        }
        Ok(mismatched)
    }
}

/// 首次记账时懒创建余额行。
/// `ON CONFLICT DO NOTHING` 让并发的首次记账都能拿到同一行再加锁。
async fn ensure_balance<C>(
    conn: &C,
    user_id: &str,
    asset: Asset,
    now: DateTime<Utc>,
) -> AppResult<()>
where
    C: ConnectionTrait,
{
    let row = balances::ActiveModel {
        user_id: Set(user_id.to_string()),
        asset: Set(asset),
        total: Set(0),
        frozen: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    balances::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([balances::Column::UserId, balances::Column::Asset])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
