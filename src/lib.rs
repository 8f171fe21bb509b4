//! # Animation Frame Gen
//!
//! 一个基于多模态大模型的动画帧批量生成工具
//!
//! 给定一张参考图和一段动作描述，调用兼容 OpenAI API 的图像生成服务，
//! 逐帧生成角色动画序列。
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 封装对远端模型服务的调用
//! - `LlmClient` - 多模态 chat-completion 客户端（文本 + 内联图片）
//! - `ImageModel` - 模型调用的抽象接口，便于测试替换
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个帧
//! - `FrameService` - 单帧生成能力（构建提示词 → 请求 → 解析 → 物化）
//! - `reply_parser` - 从自由文本回复中提取图片引用（三段式策略）
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/` - 批量帧生成器，管理分组并发和取消
//! - `FrameGenerator` - 每批 3 个并发请求，批间检查取消信号
//!
//! ### ④ 应用层（App）
//! - `app` - 读取参考图、运行生成、落盘输出帧
//!
//! ## 并发模型
//!
//! ```text
//! FrameGenerator (处理 0..N 帧)
//!     ↓ 每批 3 个，错峰启动
//! FrameService (处理单个 FrameRequest)
//!     ↓
//! LlmClient (一次多模态请求)
//!     ↓
//! reply_parser (markdown → 裸 URL → base64)
//! ```

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use app::App;
pub use clients::{ImageModel, LlmClient};
pub use config::{Config, CredentialPrompter, NoticePrompter};
pub use error::{AppError, AppResult, ConfigError, LlmError, ResourceError};
pub use models::{FrameRequest, FrameResult, ImageRef};
pub use orchestrator::FrameGenerator;
pub use services::{extract_image_ref, FrameService};
