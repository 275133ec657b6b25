use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSku {
    pub product_id: String,
    pub code: Option<String>,
    pub title: Option<String>,
    pub price: i64,
    pub stock: i32,
}

/// Result of checking a SKU counter against its stock log.
#[derive(Debug, Clone, Serialize)]
pub struct StockAudit {
    pub sku_id: String,
    pub stock: i32,
    /// Σ quantity over every log row of the SKU.
    pub logged_total: i64,
    pub last_after: Option<i32>,
    pub log_count: u64,
}

impl StockAudit {
    pub fn is_consistent(&self) -> bool {
        i64::from(self.stock) == self.logged_total
            && self.last_after.is_none_or(|after| after == self.stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_consistency() {
        let mut audit = StockAudit {
            sku_id: "s1".into(),
            stock: 95,
            logged_total: 95,
            last_after: Some(95),
            log_count: 3,
        };
        assert!(audit.is_consistent());

        audit.last_after = Some(90);
        assert!(!audit.is_consistent());

        audit.last_after = Some(95);
        audit.logged_total = 100;
        assert!(!audit.is_consistent());
    }
}
