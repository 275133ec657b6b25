use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sentinel stored in `total_count` for coupons without an issuance cap.
pub const UNLIMITED: i32 = -1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    /// 满减：value 为减免金额（分）
    #[sea_orm(string_value = "cash")]
    Cash,
    /// 折扣：value 为实付百分比，80 表示八折
    #[sea_orm(string_value = "discount")]
    Discount,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum CouponStatus {
    #[sea_orm(string_value = "enabled")]
    Enabled,
    #[sea_orm(string_value = "disabled")]
    Disabled,
}

impl std::fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CouponStatus::Enabled => write!(f, "enabled"),
            CouponStatus::Disabled => write!(f, "disabled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub coupon_type: CouponType,
    pub value: i64,
    pub min_spend: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_count: i32,
    pub taken_count: i32,
    pub status: CouponStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_unlimited(&self) -> bool {
        self.total_count == UNLIMITED
    }

    /// 剩余可领取数量，不限量时返回 None
    pub fn remaining(&self) -> Option<i32> {
        if self.is_unlimited() {
            None
        } else {
            Some((self.total_count - self.taken_count).max(0))
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.is_unlimited() || self.taken_count < self.total_count
    }

    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_time && now <= self.end_time
    }

    /// Discount granted on `order_amount`, never more than the amount itself.
    pub fn discount_for(&self, order_amount: i64) -> i64 {
        if order_amount <= 0 {
            return 0;
        }
        let discount = match self.coupon_type {
            CouponType::Cash => self.value,
            CouponType::Discount => {
                let paid_percent = self.value.clamp(0, 100);
                order_amount * (100 - paid_percent) / 100
            }
        };
        discount.clamp(0, order_amount)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
