use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 订单状态机
///
/// pending -> paid -> shipping -> done
/// pending -> closed
/// refunded 只能由退款流程写入，不是四个迁移动作的目标
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "shipping")]
    Shipping,
    #[sea_orm(string_value = "done")]
    Done,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Paid)
                | (OrderStatus::Paid, OrderStatus::Shipping)
                | (OrderStatus::Shipping, OrderStatus::Done)
                | (OrderStatus::Pending, OrderStatus::Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Done | OrderStatus::Closed | OrderStatus::Refunded
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Paid => write!(f, "paid"),
            OrderStatus::Shipping => write!(f, "shipping"),
            OrderStatus::Done => write!(f, "done"),
            OrderStatus::Closed => write!(f, "closed"),
            OrderStatus::Refunded => write!(f, "refunded"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub order_no: String,
    pub user_id: String,
    pub total_amount: i64,
    pub pay_amount: i64,
    pub discount: i64,
    pub status: OrderStatus,
    pub pay_method: Option<String>,
    pub transaction_id: Option<String>,
    pub address_snapshot: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
