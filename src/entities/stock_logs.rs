use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum StockChangeType {
    #[sea_orm(string_value = "order")]
    Order,
    #[sea_orm(string_value = "cancel")]
    Cancel,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "return")]
    Return,
}

impl std::fmt::Display for StockChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockChangeType::Order => write!(f, "order"),
            StockChangeType::Cancel => write!(f, "cancel"),
            StockChangeType::Admin => write!(f, "admin"),
            StockChangeType::Return => write!(f, "return"),
        }
    }
}

/// 库存变动流水（只追加）
/// - quantity: 正数入库，负数扣减
/// - stock_after == stock_before + quantity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub sku_id: String,
    pub order_id: Option<String>,
    pub quantity: i32,
    pub change_type: StockChangeType,
    pub stock_before: i32,
    pub stock_after: i32,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
