//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量帧生成的调度，是整个系统的"指挥中心"。
//!
//! ### `batch_generator` - 批量帧生成器
//! - 把 N 个帧请求划分为固定大小的批次
//! - 批内并发、错峰启动，批间严格串行
//! - 在批次边界轮询取消信号
//! - 按帧序号顺序拼装输出序列
//!
//! ## 层次关系
//!
//! ```text
//! FrameGenerator (处理 0..N 帧)
//!     ↓
//! FrameService (处理单个 FrameRequest)
//!     ↓
//! LlmClient (一次多模态请求)
//! ```
//!
//! ## 设计原则
//!
//! 1. **快速失败**：任何一帧的致命错误中止整次生成，不返回部分结果
//! 2. **顺序保证**：批内完成顺序不影响输出顺序
//! 3. **协作式取消**：只在批次边界检查，不抢占已发出的请求

pub mod batch_generator;

pub use batch_generator::FrameGenerator;
