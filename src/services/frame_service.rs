//! 单帧生成服务 - 业务能力层
//!
//! 只负责"生成一帧"能力，不关心批次和顺序
//!
//! ## 处理流程
//!
//! 1. 根据帧序号和动作描述构建确定性的生成指令
//! 2. 发送一次多模态请求（指令 + 内联参考图）
//! 3. 用三段式策略解析回复（见 `reply_parser`）
//! 4. URL 引用下载并物化为本地字节，下载失败时降级为透传 URL
//!
//! ## 职责边界
//! - 不出现 Vec<FrameRequest>
//! - 不关心批次划分和取消信号

use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clients::{ImageModel, LlmClient};
use crate::config::Config;
use crate::error::{AppResult, ResourceError};
use crate::models::{FrameRequest, FrameResult, ImageRef};
use crate::services::reply_parser::extract_image_ref;

/// 单帧生成服务
pub struct FrameService {
    model: Arc<dyn ImageModel>,
    http: reqwest::Client,
}

impl FrameService {
    /// 创建新的单帧生成服务
    pub fn new(config: &Config) -> Self {
        Self::with_model(Arc::new(LlmClient::new(config)))
    }

    /// 使用自定义模型实现创建服务
    pub fn with_model(model: Arc<dyn ImageModel>) -> Self {
        Self {
            model,
            http: reqwest::Client::new(),
        }
    }

    /// 生成单个帧
    ///
    /// # 参数
    /// - `request`: 单帧生成请求
    ///
    /// # 返回
    /// 返回已物化的本地图片字节；URL 下载失败时返回透传的远程 URL。
    pub async fn generate_frame(&self, request: &FrameRequest) -> AppResult<FrameResult> {
        debug!(
            "开始生成第 {}/{} 帧",
            request.frame_index + 1,
            request.total_frames
        );

        let prompt = build_frame_prompt(request);
        let reply = self
            .model
            .request_frame(&prompt, &request.image_data_url())
            .await?;

        match extract_image_ref(&reply)? {
            ImageRef::Url(url) => match self.fetch_image(&url).await {
                Ok((bytes, mime_type)) => {
                    debug!("第 {} 帧物化完成，{} 字节", request.frame_index + 1, bytes.len());
                    Ok(FrameResult::Materialized { bytes, mime_type })
                }
                Err(e) => {
                    // 下载失败不致命：退化为透传 URL，由调用方自行取用
                    warn!("⚠️ 第 {} 帧{}，回退为远程 URL", request.frame_index + 1, e);
                    Ok(FrameResult::Remote { url })
                }
            },
            ImageRef::Inline(bytes) => Ok(FrameResult::Materialized {
                bytes,
                // 内联 base64 未携带类型信息，统一按 PNG 处理
                mime_type: "image/png".to_string(),
            }),
        }
    }

    /// 下载 URL 指向的图片并返回（字节, MIME 类型）
    async fn fetch_image(&self, url: &str) -> Result<(Vec<u8>, String), ResourceError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ResourceError::fetch_failed(url, e))?
            .error_for_status()
            .map_err(|e| ResourceError::fetch_failed(url, e))?;

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ResourceError::fetch_failed(url, e))?
            .to_vec();

        Ok((bytes, mime_type))
    }
}

// ========== 指令构建 ==========

/// 构建单帧的生成指令
///
/// 指令完全由输入决定，不引入任何随机性：
/// 相同的（帧序号、总帧数、动作描述）必然产出相同的指令。
fn build_frame_prompt(request: &FrameRequest) -> String {
    format!(
        r#"Generate frame {frame} of {total} in an animation sequence of the character performing: {action}.
The character is the same cute full-body cartoon mascot shown in the reference image.
Hard requirements:
1. Orthographic frontal view, no perspective distortion.
2. Pure white background.
3. The entire character is visible, nothing cropped.
4. Body proportions stay identical to the reference image in every frame.
5. No text, no extra objects, no watermarks or markings of any kind.
Return exactly one generated image."#,
        frame = request.frame_index + 1,
        total = request.total_frames,
        action = request.action_prompt,
    )
}
