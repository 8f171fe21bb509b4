use tracing::warn;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    /// API 密钥（必须非空，否则拒绝发起任何请求）
    pub api_key: String,
    /// 兼容 OpenAI API 的服务地址
    pub api_base_url: String,
    /// 模型名称
    pub model_name: String,
    // --- 生成任务配置 ---
    /// 参考图路径
    pub reference_image_path: String,
    /// 动作描述（自由文本）
    pub action_prompt: String,
    /// 生成帧数
    pub frame_count: usize,
    /// 输出目录
    pub output_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            model_name: "gemini-2.5-flash-image-preview".to_string(),
            reference_image_path: "reference.png".to_string(),
            action_prompt: "walk cycle".to_string(),
            frame_count: 8,
            output_dir: "output_frames".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_key: std::env::var("LLM_API_KEY").unwrap_or(default.api_key),
            api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.api_base_url),
            model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.model_name),
            reference_image_path: std::env::var("REFERENCE_IMAGE_PATH")
                .unwrap_or(default.reference_image_path),
            action_prompt: std::env::var("ACTION_PROMPT").unwrap_or(default.action_prompt),
            frame_count: std::env::var("FRAME_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.frame_count),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
        }
    }

    /// 检查凭证是否可用
    ///
    /// 密钥为空（或只有空白字符）视为未配置。
    pub fn has_valid_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// 凭证配置引导能力
///
/// 不同宿主环境提供不同的引导方式（桌面端可弹出设置界面等），
/// 由调用方注入具体实现。
pub trait CredentialPrompter {
    /// 引导用户完成 API 密钥配置
    fn request_setup(&self);
}

/// 默认实现：没有交互能力时，降级为一条面向用户的日志提示
pub struct NoticePrompter;

impl CredentialPrompter for NoticePrompter {
    fn request_setup(&self) {
        warn!("⚠️ 未检测到 API 密钥");
        warn!("💡 请设置环境变量 LLM_API_KEY 后重新运行程序");
    }
}
