//! 帧生成的数据模型
//!
//! - `FrameRequest` - 单帧生成请求，构建后不可变
//! - `FrameResult` - 单帧生成结果（本地字节 或 透传 URL）
//! - `ImageRef` - 从回复文本解析出的中间图片引用

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::sync::Arc;

/// 单帧生成请求
///
/// 每个待生成的帧对应一个实例。参考图在所有帧之间共享（Arc），
/// 构建后不再修改。
#[derive(Clone, Debug)]
pub struct FrameRequest {
    /// 参考图原始字节
    pub reference_image: Arc<Vec<u8>>,
    /// 参考图 MIME 类型（如 image/png）
    pub mime_type: String,
    /// 动作描述（自由文本）
    pub action_prompt: String,
    /// 帧序号（0 开始）
    pub frame_index: usize,
    /// 总帧数
    pub total_frames: usize,
}

impl FrameRequest {
    pub fn new(
        reference_image: Arc<Vec<u8>>,
        mime_type: impl Into<String>,
        action_prompt: impl Into<String>,
        frame_index: usize,
        total_frames: usize,
    ) -> Self {
        Self {
            reference_image,
            mime_type: mime_type.into(),
            action_prompt: action_prompt.into(),
            frame_index,
            total_frames,
        }
    }

    /// 把参考图编码为内联 data URL，随请求一起发送
    pub fn image_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            STANDARD.encode(self.reference_image.as_slice())
        )
    }
}

/// 单帧生成结果
///
/// 远端回复解析成功后的最终产物。优先物化为本地字节，
/// 下载失败时退化为透传远程 URL（由调用方自行处理跨域等问题）。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameResult {
    /// 已物化的本地图片资源
    Materialized { bytes: Vec<u8>, mime_type: String },
    /// 下载失败时透传的远程 URL
    Remote { url: String },
}

impl FrameResult {
    /// 是否为透传的远程 URL
    pub fn is_remote(&self) -> bool {
        matches!(self, FrameResult::Remote { .. })
    }
}

/// 从回复文本中解析出的图片引用
///
/// `reply_parser` 的输出，尚未物化。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageRef {
    /// 回复中的图片 URL（markdown 内嵌或裸 URL）
    Url(String),
    /// 回复中内联的 base64 图片，已解码为字节
    Inline(Vec<u8>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_data_url() {
        let request = FrameRequest::new(
            Arc::new(vec![0x89, 0x50, 0x4E, 0x47]),
            "image/png",
            "jump",
            0,
            4,
        );
        let url = request.image_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(url, "data:image/png;base64,iVBORw==");
    }
}
