//! 应用层
//!
//! ## 职责
//!
//! 1. **启动检查**：校验凭证，缺失时引导用户配置
//! 2. **输入准备**：读取参考图、推断 MIME 类型
//! 3. **运行生成**：调用编排层，Ctrl-C 接入取消信号
//! 4. **结果落盘**：物化帧写入输出目录，透传 URL 写入文本文件

use anyhow::{Context, Result};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Config, CredentialPrompter, NoticePrompter};
use crate::models::FrameResult;
use crate::orchestrator::FrameGenerator;
use crate::utils::logging::{log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    generator: FrameGenerator,
}

impl App {
    /// 初始化应用
    ///
    /// 凭证缺失时先给出配置引导，再返回错误。
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        if !config.has_valid_credential() {
            NoticePrompter.request_setup();
        }
        let generator = FrameGenerator::new(&config)?;

        Ok(Self { config, generator })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        // 读取参考图
        let image_path = &self.config.reference_image_path;
        let reference_image = tokio::fs::read(image_path)
            .await
            .with_context(|| format!("读取参考图失败: {}", image_path))?;
        let mime_type = guess_mime_type(image_path);

        info!(
            "✓ 参考图已加载: {} ({} 字节, {})",
            image_path,
            reference_image.len(),
            mime_type
        );

        // Ctrl-C 接入取消信号
        let cancel = CancellationToken::new();
        let ctrl_c_token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("🛑 收到 Ctrl-C，将在当前批次结束后停止");
                ctrl_c_token.cancel();
            }
        });

        // 批量生成
        let results = self
            .generator
            .generate_frames(
                reference_image,
                &mime_type,
                &self.config.action_prompt,
                self.config.frame_count,
                Some(&cancel),
            )
            .await?;

        // 落盘输出
        let (materialized, remote) = self.save_frames(&results).await?;
        print_final_stats(materialized, remote, &self.config.output_dir);

        Ok(())
    }

    /// 把结果序列写入输出目录
    ///
    /// # 返回
    /// 返回（物化帧数, 透传帧数）
    async fn save_frames(&self, results: &[FrameResult]) -> Result<(usize, usize)> {
        let output_dir = Path::new(&self.config.output_dir);
        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("创建输出目录失败: {}", self.config.output_dir))?;

        let mut materialized = 0usize;
        let mut remote = 0usize;

        for (index, result) in results.iter().enumerate() {
            match result {
                FrameResult::Materialized { bytes, mime_type } => {
                    let path =
                        output_dir.join(format!("frame_{:02}.{}", index, extension_for(mime_type)));
                    tokio::fs::write(&path, bytes)
                        .await
                        .with_context(|| format!("写入帧文件失败: {}", path.display()))?;
                    info!("💾 第 {} 帧已保存: {}", index + 1, path.display());
                    materialized += 1;
                }
                FrameResult::Remote { url } => {
                    // 下载失败的帧只拿到了 URL，记录下来由用户自行取用
                    let path = output_dir.join(format!("frame_{:02}.url.txt", index));
                    tokio::fs::write(&path, url)
                        .await
                        .with_context(|| format!("写入 URL 文件失败: {}", path.display()))?;
                    info!("🔗 第 {} 帧仅有远程 URL: {}", index + 1, url);
                    remote += 1;
                }
            }
        }

        Ok((materialized, remote))
    }
}

// ========== 辅助函数 ==========

/// 根据文件扩展名推断 MIME 类型
fn guess_mime_type(path: &str) -> String {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/png",
    }
    .to_string()
}

/// 根据 MIME 类型选择输出文件扩展名
fn extension_for(mime_type: &str) -> &str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}
