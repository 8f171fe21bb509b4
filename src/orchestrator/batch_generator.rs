//! 批量帧生成器 - 编排层
//!
//! ## 核心功能
//!
//! 1. **分批处理**：每批固定 3 个并发请求，上一批全部完成后才开始下一批
//! 2. **错峰启动**：批内按位置错开 100ms 启动，减轻远端限流压力
//! 3. **取消轮询**：每批开始前和完成后各检查一次取消信号
//! 4. **顺序拼装**：按帧序号顺序拼装结果，与批内完成顺序无关

use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};
use crate::models::{FrameRequest, FrameResult};
use crate::services::FrameService;
use crate::utils::logging::{log_batch_complete, log_batch_start};

/// 每批并发请求数
///
/// 刻意保守的固定上限，用来尊重远端服务的限流，不随负载调整。
const GROUP_SIZE: usize = 3;

/// 批内错峰启动的间隔（毫秒）
const STAGGER_MS: u64 = 100;

/// 批量帧生成器
pub struct FrameGenerator {
    service: FrameService,
}

impl std::fmt::Debug for FrameGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameGenerator").finish_non_exhaustive()
    }
}

impl FrameGenerator {
    /// 创建新的批量帧生成器
    ///
    /// 凭证缺失时立即失败，不会发起任何网络请求。
    pub fn new(config: &Config) -> AppResult<Self> {
        if !config.has_valid_credential() {
            return Err(AppError::Config(ConfigError::MissingApiKey));
        }
        Ok(Self {
            service: FrameService::new(config),
        })
    }

    /// 使用自定义单帧服务创建生成器
    pub fn with_service(service: FrameService) -> Self {
        Self { service }
    }

    /// 批量生成动画帧
    ///
    /// # 参数
    /// - `reference_image`: 参考图原始字节
    /// - `mime_type`: 参考图 MIME 类型
    /// - `action_prompt`: 动作描述
    /// - `count`: 生成帧数
    /// - `cancel`: 取消信号（可选），只在批次边界生效
    ///
    /// # 返回
    /// 成功时返回恰好 `count` 个结果，顺序与帧序号 0..count-1 一致；
    /// 任何一帧失败或收到取消信号时整体失败，不返回部分结果。
    pub async fn generate_frames(
        &self,
        reference_image: Vec<u8>,
        mime_type: &str,
        action_prompt: &str,
        count: usize,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<Vec<FrameResult>> {
        let image = Arc::new(reference_image);
        let requests: Vec<FrameRequest> = (0..count)
            .map(|index| FrameRequest::new(image.clone(), mime_type, action_prompt, index, count))
            .collect();

        let total_groups = (count + GROUP_SIZE - 1) / GROUP_SIZE;
        let mut results: Vec<FrameResult> = Vec::with_capacity(count);

        for group_start in (0..count).step_by(GROUP_SIZE) {
            // 每批开始前检查取消信号
            if is_cancelled(cancel) {
                warn!("🛑 收到取消信号，停止发起后续请求");
                return Err(AppError::Cancelled {
                    completed_frames: results.len(),
                });
            }

            let group_end = (group_start + GROUP_SIZE).min(count);
            let group_num = group_start / GROUP_SIZE + 1;
            log_batch_start(group_num, total_groups, group_start + 1, group_end, count);

            // 批内并发执行，错峰启动；try_join_all 保证输出顺序与
            // 输入顺序一致，且任何一帧失败即整批失败
            let group_futures = requests[group_start..group_end]
                .iter()
                .enumerate()
                .map(|(position, request)| async move {
                    if position > 0 {
                        tokio::time::sleep(Duration::from_millis(STAGGER_MS * position as u64))
                            .await;
                    }
                    self.service.generate_frame(request).await
                });

            let group_results = try_join_all(group_futures).await?;

            // 批完成后、拼装结果前再检查一次取消信号
            if is_cancelled(cancel) {
                warn!("🛑 收到取消信号，丢弃本批结果并中止");
                return Err(AppError::Cancelled {
                    completed_frames: results.len() + group_results.len(),
                });
            }

            results.extend(group_results);
            log_batch_complete(group_num, group_end - group_start);
        }

        info!("✅ 全部 {} 帧生成完成", count);
        Ok(results)
    }
}

/// 读取取消信号（未提供 token 时视为未取消）
fn is_cancelled(cancel: Option<&CancellationToken>) -> bool {
    cancel.map(|token| token.is_cancelled()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ImageModel;
    use crate::error::LlmError;
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 把收到的指令原样 base64 编码返回的假模型
    ///
    /// 指令长度超过 100 字符且不含 URL，必然走内联 base64 策略，
    /// 物化后的字节就是指令本身，便于校验输出顺序。
    struct EchoPromptModel {
        calls: AtomicUsize,
    }

    impl EchoPromptModel {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ImageModel for EchoPromptModel {
        async fn request_frame(&self, prompt: &str, _image_data_url: &str) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(STANDARD.encode(prompt.as_bytes()))
        }
    }

    /// 第 N 次调用后触发取消的假模型
    struct CancelAfterModel {
        calls: AtomicUsize,
        cancel_after: usize,
        token: CancellationToken,
    }

    #[async_trait]
    impl ImageModel for CancelAfterModel {
        async fn request_frame(&self, prompt: &str, _image_data_url: &str) -> AppResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.cancel_after {
                self.token.cancel();
            }
            Ok(STANDARD.encode(prompt.as_bytes()))
        }
    }

    /// 指定帧序号返回失败的假模型
    struct FailOnIndexModel {
        fail_marker: String,
    }

    #[async_trait]
    impl ImageModel for FailOnIndexModel {
        async fn request_frame(&self, prompt: &str, _image_data_url: &str) -> AppResult<String> {
            if prompt.contains(&self.fail_marker) {
                return Err(AppError::empty_reply("fake-model"));
            }
            Ok(STANDARD.encode(prompt.as_bytes()))
        }
    }

    fn generator_with(model: Arc<dyn ImageModel>) -> FrameGenerator {
        FrameGenerator::with_service(FrameService::with_model(model))
    }

    #[test]
    fn test_missing_api_key_rejected_before_any_request() {
        let config = Config::default();
        assert!(!config.has_valid_credential());

        let err = FrameGenerator::new(&config).unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_results_match_index_order() {
        let count = 7; // 3 批：3 + 3 + 1
        let generator = generator_with(Arc::new(EchoPromptModel::new()));

        let results = generator
            .generate_frames(vec![0u8; 16], "image/png", "spin", count, None)
            .await
            .unwrap();

        assert_eq!(results.len(), count);
        for (index, result) in results.iter().enumerate() {
            match result {
                FrameResult::Materialized { bytes, .. } => {
                    let prompt = String::from_utf8(bytes.clone()).unwrap();
                    assert!(
                        prompt.contains(&format!("frame {} of {}", index + 1, count)),
                        "第 {} 个结果的内容与帧序号不符",
                        index
                    );
                }
                other => panic!("期望 Materialized，实际: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_precancelled_token_issues_no_requests() {
        let model = Arc::new(EchoPromptModel::new());
        let generator = generator_with(model.clone());

        let token = CancellationToken::new();
        token.cancel();

        let err = generator
            .generate_frames(vec![0u8; 16], "image/png", "spin", 6, Some(&token))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Cancelled {
                completed_frames: 0
            }
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0, "不应发出任何请求");
    }

    #[tokio::test]
    async fn test_cancellation_between_groups() {
        // 第一批（3 个请求）执行期间触发取消：
        // 本批跑完，但结果被丢弃，第二批不再发起
        let token = CancellationToken::new();
        let model = Arc::new(CancelAfterModel {
            calls: AtomicUsize::new(0),
            cancel_after: 3,
            token: token.clone(),
        });
        let generator = generator_with(model.clone());

        let err = generator
            .generate_frames(vec![0u8; 16], "image/png", "spin", 6, Some(&token))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Cancelled { .. }));
        assert_eq!(
            model.calls.load(Ordering::SeqCst),
            3,
            "只有第一批的请求被发出"
        );
    }

    #[tokio::test]
    async fn test_single_frame_failure_aborts_run() {
        let generator = generator_with(Arc::new(FailOnIndexModel {
            // 第 5 帧（第二批）的指令中包含 "frame 5 of 6"
            fail_marker: "frame 5 of 6".to_string(),
        }));

        let err = generator
            .generate_frames(vec![0u8; 16], "image/png", "spin", 6, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Llm(LlmError::EmptyReply { .. })));
    }

    #[tokio::test]
    async fn test_zero_count_returns_empty() {
        let model = Arc::new(EchoPromptModel::new());
        let generator = generator_with(model.clone());

        let results = generator
            .generate_frames(vec![0u8; 16], "image/png", "spin", 0, None)
            .await
            .unwrap();

        assert!(results.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }
}
