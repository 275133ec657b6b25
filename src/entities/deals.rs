use super::Asset;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "snake_case")]
pub enum DealType {
    #[sea_orm(string_value = "payment")]
    Payment,
    #[sea_orm(string_value = "refund")]
    Refund,
    #[sea_orm(string_value = "reward")]
    Reward,
    #[sea_orm(string_value = "usage")]
    Usage,
}

impl std::fmt::Display for DealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DealType::Payment => write!(f, "payment"),
            DealType::Refund => write!(f, "refund"),
            DealType::Reward => write!(f, "reward"),
            DealType::Usage => write!(f, "usage"),
        }
    }
}

/// 资金/积分流水（只追加）
/// - amount: 正数收入，负数支出
/// - balance: 本笔交易完成后的余额快照
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: String,
    pub asset: Asset,
    pub deal_type: DealType,
    pub amount: i64,
    pub balance: i64,
    pub related_id: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
