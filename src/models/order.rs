use crate::entities::{OrderStatus, order_entity, order_item_entity};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: String,
    /// 为空时自动生成
    pub order_no: Option<String>,
    pub total_amount: i64,
    pub pay_amount: i64,
    pub discount: i64,
    pub address_snapshot: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: String,
    pub sku_id: String,
    pub title: String,
    pub sku_spec: Option<String>,
    /// Unit price at the moment of purchase.
    pub price: i64,
    pub quantity: i32,
}

impl NewOrderItem {
    pub fn amount(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: order_entity::Model,
    pub items: Vec<order_item_entity::Model>,
}

/// Fields a transition may change besides `status`.
///
/// Unset fields are left untouched on the row.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pay_method: Option<String>,
    transaction_id: Option<String>,
    pay_amount: Option<i64>,
    note: Option<String>,
}

impl OrderPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pay_method(mut self, pay_method: impl Into<String>) -> Self {
        self.pay_method = Some(pay_method.into());
        self
    }

    pub fn transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn pay_amount(mut self, pay_amount: i64) -> Self {
        self.pay_amount = Some(pay_amount);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pay_method.is_none()
            && self.transaction_id.is_none()
            && self.pay_amount.is_none()
            && self.note.is_none()
    }

    pub(crate) fn apply(self, am: &mut order_entity::ActiveModel) {
        if let Some(v) = self.pay_method {
            am.pay_method = Set(Some(v));
        }
        if let Some(v) = self.transaction_id {
            am.transaction_id = Set(Some(v));
        }
        if let Some(v) = self.pay_amount {
            am.pay_amount = Set(v);
        }
        if let Some(v) = self.note {
            am.note = Set(Some(v));
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub status: Option<OrderStatus>,
}
