//! 日志工具模块
//!
//! 提供日志初始化、格式化输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化全局日志订阅器
///
/// 默认级别 info，可通过 RUST_LOG 环境变量覆盖。
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量动画帧生成模式");
    info!("🎨 模型: {}", config.model_name);
    info!("🖼️ 参考图: {}", config.reference_image_path);
    info!("🎬 动作: {} / 共 {} 帧", config.action_prompt, config.frame_count);
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `group_num`: 批次编号
/// - `total_groups`: 批次总数
/// - `start`: 起始帧编号（1 开始）
/// - `end`: 结束帧编号
/// - `total`: 总帧数
pub fn log_batch_start(
    group_num: usize,
    total_groups: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始生成第 {}/{} 批", group_num, total_groups);
    info!("🎞️ 本批帧: {}-{} / 共 {} 帧", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(group_num: usize, count: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: {} 帧", group_num, count);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `materialized`: 物化为本地字节的帧数
/// - `remote`: 降级为远程 URL 的帧数
/// - `output_dir`: 输出目录
pub fn print_final_stats(materialized: usize, remote: usize, output_dir: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部生成完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 本地物化: {} 帧", materialized);
    if remote > 0 {
        info!("🔗 远程透传: {} 帧", remote);
    }
    info!("{}", "=".repeat(60));
    info!("\n输出已保存至: {}", output_dir);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
