//! Background scheduled tasks.
//!
//! Currently one job: the periodic ledger/stock audit. Call `spawn_all` once
//! during startup.

use crate::config::LedgerConfig;
use crate::error::AppResult;
use crate::services::{InventoryService, LedgerService};
use std::time::Duration;

/// One audit pass result, mostly for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub wallet_mismatches: usize,
    pub stock_mismatches: usize,
}

impl AuditSummary {
    pub fn is_clean(&self) -> bool {
        self.wallet_mismatches == 0 && self.stock_mismatches == 0
    }
}

/// 执行一次对账：钱包 `Σ deal == balance`，库存 `Σ stock_log == stock`
pub async fn run_audit(ledger: &LedgerService, inventory: &InventoryService) -> AppResult<AuditSummary> {
    let wallets = ledger.reconcile_all().await?;
    for r in &wallets {
        log::error!(
            "Wallet reconciliation mismatch: user={} asset={} balance={} deal_sum={} last_snapshot={:?}",
            r.user_id,
            r.asset,
            r.balance,
            r.deal_sum,
            r.last_snapshot
        );
    }

    let stocks = inventory.audit_all().await?;
    for a in &stocks {
        log::error!(
            "Stock audit mismatch: sku={} stock={} logged_total={} last_after={:?}",
            a.sku_id,
            a.stock,
            a.logged_total,
            a.last_after
        );
    }

    Ok(AuditSummary {
        wallet_mismatches: wallets.len(),
        stock_mismatches: stocks.len(),
    })
}

/// Spawn all background tasks.
///
/// Detaches via `tokio::spawn`; does not block.
pub fn spawn_all(ledger: LedgerService, inventory: InventoryService, config: &LedgerConfig) {
    if !config.reconcile_enabled {
        log::info!("Reconciliation task disabled");
        return;
    }

    // 定期对账（默认每小时）
    let interval = Duration::from_secs(config.reconcile_interval_secs.max(1));
    tokio::spawn(async move {
        loop {
            match run_audit(&ledger, &inventory).await {
                Ok(summary) if summary.is_clean() => log::info!("Reconciliation passed"),
                Ok(summary) => log::info!(
                    "Reconciliation finished with {} wallet and {} stock mismatches",
                    summary.wallet_mismatches,
                    summary.stock_mismatches
                ),
                Err(e) => log::error!("Failed to run reconciliation: {e:?}"),
            }
            tokio::time::sleep(interval).await;
        }
    });
}
