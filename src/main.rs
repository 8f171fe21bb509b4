use animation_frame_gen::app::App;
use animation_frame_gen::config::Config;
use animation_frame_gen::utils::logging;
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    App::initialize(config)?.run().await?;

    Ok(())
}
