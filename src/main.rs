// ==========================================
// 钢材炉号库存台账 - 命令行入口
// ==========================================
// 职责: 打开默认数据库,输出各钢种库存与台账平衡情况
// ==========================================

use heat_inventory::app::{get_default_db_path, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    match std::env::var("HEAT_INVENTORY_LOG_FORMAT") {
        Ok(format) if format.eq_ignore_ascii_case("json") => heat_inventory::logging::init_json(),
        _ => heat_inventory::logging::init(),
    }

    tracing::info!("==================================================");
    tracing::info!("{}", heat_inventory::APP_NAME);
    tracing::info!("系统版本: {}", heat_inventory::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let app_state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    // ==========================================
    // 库存状态
    // ==========================================
    for status in app_state.dashboard_api.inventory_status().await? {
        tracing::info!(
            steel_type = %status.steel_type,
            total_received_kg = status.total_received_kg,
            total_consumed_kg = status.total_consumed_kg,
            current_stock_kg = status.current_stock_kg,
            heats = status.heats.len(),
            stock_level = %status.stock_level,
            "{}",
            status.reorder_recommendation
        );
    }

    // ==========================================
    // 台账平衡校验
    // ==========================================
    let balances = app_state.dashboard_api.reconcile().await?;
    let drifted = balances.iter().filter(|b| !b.balanced).count();
    if drifted == 0 {
        tracing::info!("台账平衡校验通过: {} 个钢种", balances.len());
    } else {
        for balance in balances.iter().filter(|b| !b.balanced) {
            tracing::warn!(
                steel_type = %balance.steel_type,
                drift_kg = balance.drift_kg,
                "台账不平衡"
            );
        }
    }

    Ok(())
}
