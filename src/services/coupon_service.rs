use crate::clock::SharedClock;
use crate::entities::{
    CouponStatus, CouponType, UserCouponStatus, coupon_entity as coupons,
    user_coupon_entity as user_coupons,
};
use crate::entities::coupons::UNLIMITED;
use crate::error::{AppError, AppResult};
use crate::models::{CouponPatch, NewCoupon};
use crate::utils::new_id;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// 优惠券服务
///
/// 领取时对模板行加排他锁 (`SELECT ... FOR UPDATE`)，
/// 因为库存计数、时间窗口和用户持有数需要在同一锁下一起判断。
/// 核销只是一次条件更新，不需要锁。
#[derive(Clone)]
pub struct CouponService {
    pool: DatabaseConnection,
    clock: SharedClock,
}

impl CouponService {
    pub fn new(pool: DatabaseConnection, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    pub async fn create_coupon(&self, req: NewCoupon) -> AppResult<coupons::Model> {
        if req.title.trim().is_empty() {
            return Err(AppError::ValidationError("Coupon title is required".into()));
        }
        if req.end_time < req.start_time {
            return Err(AppError::ValidationError(
                "Coupon end time must not be before start time".into(),
            ));
        }
        if req.value < 0 || req.min_spend < 0 {
            return Err(AppError::ValidationError(
                "Coupon value and min spend must not be negative".into(),
            ));
        }
        if req.coupon_type == CouponType::Discount && req.value > 100 {
            return Err(AppError::ValidationError(
                "Discount coupon value is a percentage between 0 and 100".into(),
            ));
        }
        let total_count = req.total_count.unwrap_or(UNLIMITED);
        if total_count < UNLIMITED {
            return Err(AppError::ValidationError(
                "Coupon total count must be -1 (unlimited) or non-negative".into(),
            ));
        }

        let now = self.clock.now();
        let coupon = coupons::ActiveModel {
            id: Set(new_id()),
            title: Set(req.title),
            description: Set(req.description),
            coupon_type: Set(req.coupon_type),
            value: Set(req.value),
            min_spend: Set(req.min_spend),
            start_time: Set(req.start_time),
            end_time: Set(req.end_time),
            total_count: Set(total_count),
            taken_count: Set(0),
            status: Set(req.status),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await?;

        log::info!("Coupon created: {} ({})", coupon.id, coupon.title);
        Ok(coupon)
    }

    pub async fn get_coupon(&self, coupon_id: &str) -> AppResult<coupons::Model> {
        coupons::Entity::find_by_id(coupon_id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::CouponNotFound)
    }

    pub async fn get_user_coupon(&self, user_coupon_id: &str) -> AppResult<user_coupons::Model> {
        user_coupons::Entity::find_by_id(user_coupon_id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::CouponNotFound)
    }

    /// 修改优惠券模板。与领取共用同一把行锁，发行量不能改到已领取数以下。
    pub async fn update_coupon(
        &self,
        coupon_id: &str,
        patch: CouponPatch,
    ) -> AppResult<coupons::Model> {
        let txn = self.pool.begin().await?;

        let coupon = coupons::Entity::find_by_id(coupon_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::CouponNotFound)?;

        if let Some(total) = patch.total_count
            && total != UNLIMITED
            && (total < 0 || total < coupon.taken_count)
        {
            return Err(AppError::ValidationError(format!(
                "Total count {total} is below the {} coupons already taken",
                coupon.taken_count
            )));
        }
        if let Some(end) = patch.end_time
            && end < coupon.start_time
        {
            return Err(AppError::ValidationError(
                "Coupon end time must not be before start time".into(),
            ));
        }

        let mut am = coupon.into_active_model();
        patch.apply(&mut am);
        am.updated_at = Set(self.clock.now());
        let updated = am.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    pub async fn issue(&self, user_id: &str, coupon_id: &str) -> AppResult<user_coupons::Model> {
        self.issue_in(&self.pool, user_id, coupon_id).await
    }

    /// 领取优惠券
    ///
    /// 检查顺序固定：存在且启用 -> 时间窗口 -> 剩余数量 -> 每人限领一张。
    pub async fn issue_in<C>(
        &self,
        conn: &C,
        user_id: &str,
        coupon_id: &str,
    ) -> AppResult<user_coupons::Model>
    where
        C: TransactionTrait,
    {
        let now = self.clock.now();
        let txn = conn.begin().await?;

        // SELECT * FROM coupons WHERE id = ? FOR UPDATE
        let coupon = coupons::Entity::find_by_id(coupon_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::CouponNotFound)?;

        if coupon.status != CouponStatus::Enabled {
            return Err(AppError::CouponNotFound);
        }
        if !coupon.is_within_window(now) {
            return Err(AppError::CouponExpired);
        }
        if !coupon.has_capacity() {
            return Err(AppError::CouponEmpty);
        }

        let held = user_coupons::Entity::find()
            .filter(user_coupons::Column::UserId.eq(user_id))
            .filter(user_coupons::Column::CouponId.eq(coupon_id))
            .count(&txn)
            .await?;
        if held > 0 {
            return Err(AppError::AlreadyTaken);
        }

        coupons::Entity::update_many()
            .col_expr(
                coupons::Column::TakenCount,
                Expr::col(coupons::Column::TakenCount).add(1),
            )
            .col_expr(coupons::Column::UpdatedAt, Expr::value(now))
            .filter(coupons::Column::Id.eq(coupon_id))
            .exec(&txn)
            .await?;

        let user_coupon = user_coupons::ActiveModel {
            id: Set(new_id()),
            user_id: Set(user_id.to_string()),
            coupon_id: Set(coupon_id.to_string()),
            status: Set(UserCouponStatus::Unused),
            used_at: Set(None),
            order_id: Set(None),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        log::info!("Coupon {coupon_id} issued to user {user_id}");
        Ok(user_coupon)
    }

    /// 只读校验，返回券模板以便调用方计算优惠金额。
    /// 核销时需要再次经过 `use_coupon` 的条件更新，校验通过不代表一定能用。
    pub async fn verify(
        &self,
        user_coupon_id: &str,
        order_amount: i64,
    ) -> AppResult<coupons::Model> {
        let user_coupon = self.get_user_coupon(user_coupon_id).await?;
        if user_coupon.status == UserCouponStatus::Used {
            return Err(AppError::CouponUsed);
        }

        let coupon = self.get_coupon(&user_coupon.coupon_id).await?;
        if self.clock.now() > coupon.end_time {
            return Err(AppError::CouponExpired);
        }
        if order_amount < coupon.min_spend {
            return Err(AppError::MinSpend);
        }
        Ok(coupon)
    }

    pub async fn use_coupon(&self, user_coupon_id: &str, order_id: &str) -> AppResult<()> {
        self.use_coupon_in(&self.pool, user_coupon_id, order_id)
            .await
    }

    /// 核销：`UPDATE user_coupons SET status = 'used' ... WHERE id = ? AND status = 'unused'`
    pub async fn use_coupon_in<C>(
        &self,
        conn: &C,
        user_coupon_id: &str,
        order_id: &str,
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let res = user_coupons::Entity::update_many()
            .set(user_coupons::ActiveModel {
                status: Set(UserCouponStatus::Used),
                used_at: Set(Some(self.clock.now())),
                order_id: Set(Some(order_id.to_string())),
                ..Default::default()
            })
            .filter(user_coupons::Column::Id.eq(user_coupon_id))
            .filter(user_coupons::Column::Status.eq(UserCouponStatus::Unused))
            .exec(conn)
            .await?;

        if res.rows_affected == 0 {
            log::warn!("Coupon use rejected: user_coupon={user_coupon_id} order={order_id}");
            return Err(AppError::CouponUsed);
        }
        Ok(())
    }

    /// 用户未使用的优惠券，最新领取的在前
    pub async fn list_user_coupons(&self, user_id: &str) -> AppResult<Vec<user_coupons::Model>> {
        let list = user_coupons::Entity::find()
            .filter(user_coupons::Column::UserId.eq(user_id))
            .filter(user_coupons::Column::Status.eq(UserCouponStatus::Unused))
            .order_by_desc(user_coupons::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        Ok(list)
    }

    pub async fn count_user_coupons(&self, user_id: &str) -> AppResult<u64> {
        let count = user_coupons::Entity::find()
            .filter(user_coupons::Column::UserId.eq(user_id))
            .filter(user_coupons::Column::Status.eq(UserCouponStatus::Unused))
            .count(&self.pool)
            .await?;
        Ok(count)
    }

    /// Coupon templates that can still be claimed right now.
    pub async fn list_available(&self) -> AppResult<Vec<coupons::Model>> {
        let now = self.clock.now();
        let list = coupons::Entity::find()
            .filter(coupons::Column::Status.eq(CouponStatus::Enabled))
            .filter(coupons::Column::StartTime.lte(now))
            .filter(coupons::Column::EndTime.gte(now))
            .order_by_asc(coupons::Column::EndTime)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().filter(|c| c.has_capacity()).collect())
    }
}
