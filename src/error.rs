use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 配置错误
    Config(ConfigError),
    /// LLM 服务错误
    Llm(LlmError),
    /// 图片资源错误
    Resource(ResourceError),
    /// 调用方取消（只在批次边界触发）
    Cancelled {
        /// 取消前已在内部完成的帧数（不会返回给调用方）
        completed_frames: usize,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Llm(e) => write!(f, "LLM错误: {}", e),
            AppError::Resource(e) => write!(f, "资源错误: {}", e),
            AppError::Cancelled { completed_frames } => {
                write!(f, "生成已被调用方取消 (已完成 {} 帧)", completed_frames)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Llm(e) => Some(e),
            AppError::Resource(e) => Some(e),
            AppError::Cancelled { .. } => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// API 密钥缺失
    MissingApiKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiKey => {
                write!(f, "API 密钥缺失，请设置环境变量 LLM_API_KEY")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// LLM 服务错误
#[derive(Debug)]
pub enum LlmError {
    /// API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回结果为空
    EmptyReply {
        model: String,
    },
    /// 回复中找不到任何图片引用
    UnparsableReply {
        /// 原始回复的截断前缀，用于排查问题
        snippet: String,
    },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ApiCallFailed { model, source } => {
                write!(f, "LLM API调用失败 (模型: {}): {}", model, source)
            }
            LlmError::EmptyReply { model } => {
                write!(f, "LLM返回结果为空 (模型: {})", model)
            }
            LlmError::UnparsableReply { snippet } => {
                write!(f, "回复中未找到图片引用，原始回复前缀: {}", snippet)
            }
        }
    }
}

impl std::error::Error for LlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LlmError::ApiCallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 图片资源错误
///
/// 下载失败是非致命的：FrameService 会捕获并降级为透传 URL。
#[derive(Debug)]
pub enum ResourceError {
    /// 图片下载失败
    FetchFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::FetchFailed { url, source } => {
                write!(f, "图片下载失败 ({}): {}", url, source)
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::FetchFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 创建空回复错误
    pub fn empty_reply(model: impl Into<String>) -> Self {
        AppError::Llm(LlmError::EmptyReply {
            model: model.into(),
        })
    }

    /// 创建回复不可解析错误
    pub fn unparsable_reply(snippet: impl Into<String>) -> Self {
        AppError::Llm(LlmError::UnparsableReply {
            snippet: snippet.into(),
        })
    }
}

impl ResourceError {
    /// 创建图片下载错误
    pub fn fetch_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ResourceError::FetchFailed {
            url: url.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
