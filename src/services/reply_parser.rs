//! 回复解析 - 业务能力层
//!
//! 从模型的自由文本回复中提取图片引用。
//!
//! ## 三段式策略（顺序敏感，先命中先返回）
//!
//! 1. markdown 图片引用 `![alt](https://...)` 中内嵌的 URL
//! 2. 文本中任意位置出现的裸 HTTP(S) URL
//! 3. 长度 ≥ 100 且不含空白的 base64 连续串，直接解码为图片字节
//!
//! 后两种是置信度逐级降低的兜底策略，不要调整顺序。

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::ImageRef;
use crate::utils::logging::truncate_text;

/// base64 兜底策略要求的最小连续串长度
const MIN_BASE64_TOKEN_LEN: usize = 100;

/// 解析失败时保留的原始回复前缀长度
const SNIPPET_LEN: usize = 100;

/// 从回复文本中提取图片引用
///
/// # 参数
/// - `reply`: 模型的原始文本回复
///
/// # 返回
/// 命中任一策略时返回 `ImageRef`，三种策略都未命中时
/// 返回带原始回复前缀的 `UnparsableReply` 错误。
pub fn extract_image_ref(reply: &str) -> AppResult<ImageRef> {
    let reply = reply.trim();

    // 策略 1: markdown 图片引用
    if let Ok(re) = Regex::new(r"!\[[^\]]*\]\((https?://[^\s)]+)\)") {
        if let Some(caps) = re.captures(reply) {
            let url = caps[1].to_string();
            debug!("命中 markdown 图片引用: {}", url);
            return Ok(ImageRef::Url(url));
        }
    }

    // 策略 2: 裸 URL
    if let Ok(re) = Regex::new(r#"https?://[^\s)"'<>]+"#) {
        if let Some(m) = re.find(reply) {
            let url = m.as_str().to_string();
            debug!("命中裸 URL: {}", url);
            return Ok(ImageRef::Url(url));
        }
    }

    // 策略 3: 内联 base64 串
    // 注意：这里不校验实际图片格式，下游统一按 PNG 处理
    if let Ok(re) = Regex::new(&format!("[A-Za-z0-9+/=]{{{},}}", MIN_BASE64_TOKEN_LEN)) {
        if let Some(m) = re.find(reply) {
            if let Ok(bytes) = STANDARD.decode(m.as_str()) {
                debug!("命中内联 base64，解码后 {} 字节", bytes.len());
                return Ok(ImageRef::Inline(bytes));
            }
        }
    }

    Err(AppError::unparsable_reply(truncate_text(
        reply,
        SNIPPET_LEN,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;

    #[test]
    fn test_markdown_image_reference() {
        let reply = "这是生成的帧：![frame 1](https://x/y.png) 希望你满意。";
        let result = extract_image_ref(reply).unwrap();
        assert_eq!(result, ImageRef::Url("https://x/y.png".to_string()));
    }

    #[test]
    fn test_markdown_takes_priority_over_bare_url() {
        // markdown 引用在裸 URL 之后出现，依然优先命中
        let reply = "参考 https://example.com/doc 生成结果 ![f](https://img.host/f.png)";
        let result = extract_image_ref(reply).unwrap();
        assert_eq!(result, ImageRef::Url("https://img.host/f.png".to_string()));
    }

    #[test]
    fn test_bare_url() {
        let reply = "图片已生成，地址为 https://x/y.png";
        let result = extract_image_ref(reply).unwrap();
        assert_eq!(result, ImageRef::Url("https://x/y.png".to_string()));
    }

    #[test]
    fn test_inline_base64_token() {
        // "QUJD" 解码为 "ABC"，重复 125 次得到 500 字符的连续串
        let token = "QUJD".repeat(125);
        assert_eq!(token.len(), 500);
        let reply = format!("生成结果如下：\n{}\n以上。", token);

        let result = extract_image_ref(&reply).unwrap();
        assert_eq!(result, ImageRef::Inline(b"ABC".repeat(125)));
    }

    #[test]
    fn test_short_token_not_matched() {
        // 99 字符不满足最小长度要求
        let token = "A".repeat(99);
        let result = extract_image_ref(&token);
        assert!(result.is_err());
    }

    #[test]
    fn test_whitespace_breaks_token() {
        // 两段 60 字符的串被空格隔开，不构成 ≥100 的连续串
        let reply = format!("{} {}", "B".repeat(60), "C".repeat(60));
        assert!(extract_image_ref(&reply).is_err());
    }

    #[test]
    fn test_unparsable_reply_keeps_prefix() {
        // 没有 URL、没有 markdown、也没有 ≥100 的连续串
        let reply = "抱歉无法生成该图片 sorry cannot comply ".repeat(8);
        let err = extract_image_ref(&reply).unwrap_err();

        match err {
            crate::error::AppError::Llm(LlmError::UnparsableReply { snippet }) => {
                let expected: String = reply.chars().take(100).collect();
                assert!(snippet.starts_with(&expected));
            }
            other => panic!("期望 UnparsableReply，实际: {}", other),
        }
    }
}
