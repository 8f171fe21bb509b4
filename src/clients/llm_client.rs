//! 多模态 LLM 客户端
//!
//! 只负责"发一次请求、拿回一段文本"，不关心回复怎么解析
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Gemini、Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// 图像生成模型的抽象接口
///
/// 编排层和业务层只依赖这个接口，不依赖具体的 HTTP 客户端，
/// 测试时可以用假实现替换。
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// 发送一次"文本指令 + 内联参考图"的多模态请求
    ///
    /// # 参数
    /// - `prompt`: 帧生成指令
    /// - `image_data_url`: 参考图的 base64 data URL
    ///
    /// # 返回
    /// 返回模型的原始文本回复（已去除首尾空白）
    async fn request_frame(&self, prompt: &str, image_data_url: &str) -> AppResult<String>;
}

/// LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.model_name.clone(),
        }
    }

    /// 创建自定义模型的 LLM 客户端
    pub fn with_model(config: &Config, model_name: impl Into<String>) -> Self {
        let mut client = Self::new(config);
        client.model_name = model_name.into();
        client
    }
}

#[async_trait]
impl ImageModel for LlmClient {
    async fn request_frame(&self, prompt: &str, image_data_url: &str) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("指令长度: {} 字符", prompt.len());

        // 构建用户消息内容：文本部分 + 内联图片部分
        let content_parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
            ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: prompt.to_string(),
                },
            ),
            ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: image_data_url.to_string(),
                        detail: Some(ImageDetail::Auto),
                    },
                },
            ),
        ];

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(
                content_parts,
            ))
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        let messages = vec![ChatCompletionRequestMessage::User(user_msg)];

        // 构建请求（回复中可能内联整张图片的 base64，max_tokens 要给足）
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .max_tokens(4096u32)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        // 调用 API
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容，空回复立即失败
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::empty_reply(&self.model_name))?;

        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::empty_reply(&self.model_name));
        }

        Ok(content)
    }
}
