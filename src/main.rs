use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use commerce_core::{
    SharedClock, SystemClock,
    config::Config,
    database::{create_pool, run_migrations},
    services::{InventoryService, LedgerService},
    tasks,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml()?;

    // 创建数据库连接池
    let pool = create_pool(&config.database).await?;

    // 运行数据库迁移
    run_migrations(&pool).await?;
    log::info!("Database migrated");

    let clock: SharedClock = Arc::new(SystemClock);
    let ledger = LedgerService::new(pool.clone(), clock.clone());
    let inventory = InventoryService::new(pool.clone(), clock);

    // 启动后台对账任务
    tasks::spawn_all(ledger, inventory, &config.ledger);

    log::info!("Commerce core worker running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    Ok(())
}
