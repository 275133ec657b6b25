use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum UserCouponStatus {
    #[sea_orm(string_value = "unused")]
    Unused,
    #[sea_orm(string_value = "used")]
    Used,
}

/// 用户持有的券实例；id 同时作为核销码
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "user_coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub coupon_id: String,
    pub status: UserCouponStatus,
    pub used_at: Option<DateTime<Utc>>,
    /// Order that consumed the coupon, or `writeoff:<staff>` for counter redemptions.
    pub order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
