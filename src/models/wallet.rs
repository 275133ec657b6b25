use crate::entities::Asset;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DealQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// 为空时返回全部资产类型
    pub asset: Option<Asset>,
}

/// Σ Deal.amount against Balance.total for one (user, asset) pair.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub user_id: String,
    pub asset: Asset,
    pub balance: i64,
    pub deal_sum: i64,
    pub last_snapshot: Option<i64>,
    pub deal_count: u64,
}

impl ReconciliationReport {
    pub fn is_consistent(&self) -> bool {
        self.balance == self.deal_sum && self.last_snapshot.is_none_or(|s| s == self.balance)
    }
}
