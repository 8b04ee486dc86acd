//! Structured extraction of collaboration events from search snippets.
//!
//! All snippets for one subject are numbered into a single text block and
//! embedded in a fixed instruction prompt. The model is asked for a bare JSON
//! array; its answer is treated as untrusted input:
//!
//! 1. A leading markdown code fence, and its closing fence if any, is stripped
//! 2. The remainder must be a JSON array of objects
//! 3. Every object must carry `brand`, `category`, `description`, `date` and
//!    `source_url` as strings
//!
//! Anything else rejects the whole answer. Neither a failed request nor a
//! rejected answer is retried; the subject simply yields nothing this run.

use crate::api::{ChatRequest, CompletionProvider, Message};
use crate::config::RadarConfig;
use crate::models::{ExtractedRecord, RawSnippet};
use crate::utils::truncate_for_log;
use chrono::{Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt::Write;
use thiserror::Error;
use tracing::{info, instrument, warn};

const SYSTEM_PROMPT: &str = "你是一个只输出 JSON 格式的助手。";

static OPENING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_-]*").expect("static regex"));

/// Why a model answer was rejected.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("model output is empty")]
    Empty,
    #[error("model output is not JSON: {0}")]
    NotJson(#[source] serde_json::Error),
    #[error("model output is JSON but not an array")]
    NotArray,
    #[error("element {index} is not an object")]
    NotAnObject { index: usize },
    #[error("element {index} is malformed: {source}")]
    BadElement {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// The oldest `YYYY-MM` an event may carry to still be reported.
pub fn cutoff_period(today: NaiveDate, validity_months: u32) -> String {
    today
        .checked_sub_months(Months::new(validity_months))
        .unwrap_or(today)
        .format("%Y-%m")
        .to_string()
}

fn format_snippets(snippets: &[RawSnippet]) -> String {
    let mut out = String::new();
    for (idx, s) in snippets.iter().enumerate() {
        let _ = write!(
            out,
            "{}. 标题: {}\n   链接: {}\n   摘要: {}\n\n",
            idx + 1,
            s.title,
            s.url,
            s.body
        );
    }
    out
}

/// The user prompt for one subject.
pub fn build_prompt(subject: &str, snippets: &[RawSnippet], cutoff: &str) -> String {
    format!(
        r#"你是一个专业的游戏商业情报分析师。请阅读以下关于“{subject}”的搜索结果：

{news}任务：从中提取**确切的、官方已确认的**商业化合作或IP联动信息。

要求：
1. 排除玩家猜测、自制内容或旧闻，只保留官方已经宣布的活动。
2. 只保留日期在 {cutoff} 及之后的活动，更早的一律忽略。
3. 如果没有发现确切的联动信息，返回空列表 []。
4. 只输出标准的 JSON 数组，不要包含任何解释文字，也不要包含 Markdown 标记（如 ```json）。
5. date 字段使用 YYYY-MM 格式。

JSON 结构示例：
[
    {{
        "brand": "肯德基",
        "category": "餐饮",
        "description": "肯德基宅急送联动，推出限定套餐和皮肤",
        "date": "2024-05",
        "source_url": "http://..."
    }}
]
"#,
        subject = subject,
        news = format_snippets(snippets),
        cutoff = cutoff,
    )
}

pub fn build_request(
    config: &RadarConfig,
    subject: &str,
    snippets: &[RawSnippet],
    today: NaiveDate,
) -> ChatRequest {
    let cutoff = cutoff_period(today, config.validity_months);
    ChatRequest {
        model: config.model.clone(),
        messages: vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(build_prompt(subject, snippets, &cutoff)),
        ],
        temperature: config.temperature,
    }
}

/// Remove a markdown code fence wrapped around the whole answer.
///
/// The opening fence (with its optional language tag) and the closing fence
/// are handled independently, so an answer cut off before its closing fence
/// still yields its body.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(opening) = OPENING_FENCE.find(trimmed) else {
        return trimmed;
    };
    let body = trimmed[opening.end()..].trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Validate a model answer into extracted records.
pub fn decode_records(raw: &str) -> Result<Vec<ExtractedRecord>, DecodeError> {
    let cleaned = strip_code_fence(raw).trim();
    if cleaned.is_empty() {
        return Err(DecodeError::Empty);
    }

    let value: Value = serde_json::from_str(cleaned).map_err(DecodeError::NotJson)?;
    let Value::Array(items) = value else {
        return Err(DecodeError::NotArray);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(DecodeError::NotAnObject { index });
            }
            serde_json::from_value::<ExtractedRecord>(item).map_err(|source| DecodeError::BadElement { index, source })
        })
        .collect()
}

/// Ask the model for the collaborations hidden in `snippets`.
///
/// Returns nothing, without calling the model, when there are no snippets.
/// Request and decode failures are logged and also return nothing.
#[instrument(level = "info", skip(provider, config, snippets, today), fields(snippet_count = snippets.len()))]
pub async fn extract<C: CompletionProvider>(
    provider: &C,
    config: &RadarConfig,
    subject: &str,
    snippets: &[RawSnippet],
    today: NaiveDate,
) -> Vec<ExtractedRecord> {
    if snippets.is_empty() {
        return Vec::new();
    }

    let request = build_request(config, subject, snippets, today);
    let raw = match provider.complete(&request).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Completion failed; no records for this subject");
            return Vec::new();
        }
    };

    match decode_records(&raw) {
        Ok(records) => {
            info!(count = records.len(), "Extracted records");
            records
        }
        Err(e) => {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&raw, 300),
                "Model returned non-conforming output; no records for this subject"
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::error::Error;

    struct ScriptedModel {
        answer: Result<String, String>,
        calls: Cell<usize>,
    }

    impl ScriptedModel {
        fn answering(answer: &str) -> Self {
            Self {
                answer: Ok(answer.to_string()),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                answer: Err("connection reset".to_string()),
                calls: Cell::new(0),
            }
        }
    }

    impl CompletionProvider for ScriptedModel {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, Box<dyn Error>> {
            self.calls.set(self.calls.get() + 1);
            self.answer.clone().map_err(|e| e.into())
        }
    }

    fn snippets(n: usize) -> Vec<RawSnippet> {
        (1..=n)
            .map(|i| RawSnippet {
                title: format!("标题{i}"),
                url: format!("http://s/{i}"),
                body: format!("摘要{i}"),
            })
            .collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    const ACME: &str = r#"[{"brand":"Acme","category":"food","description":"X collab","date":"2025-02","source_url":"http://a"}]"#;

    #[test]
    fn test_cutoff_period() {
        assert_eq!(cutoff_period(today(), 18), "2023-12");
        assert_eq!(cutoff_period(today(), 12), "2024-06");
        assert_eq!(cutoff_period(today(), 0), "2025-06");
    }

    #[test]
    fn test_prompt_contains_numbered_snippets_and_cutoff() {
        let prompt = build_prompt("王者荣耀", &snippets(2), "2023-12");
        assert!(prompt.contains("关于“王者荣耀”"));
        assert!(prompt.contains("1. 标题: 标题1\n   链接: http://s/1\n   摘要: 摘要1"));
        assert!(prompt.contains("2. 标题: 标题2"));
        assert!(prompt.contains("2023-12 及之后"));
        assert!(prompt.contains("\"source_url\": \"http://...\""));
    }

    #[test]
    fn test_build_request_uses_config() {
        let config = RadarConfig::default();
        let request = build_request(&config, "KPL", &snippets(1), today());
        assert_eq!(request.model, "deepseek-chat");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        assert!(request.temperature <= 0.2);
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  ```\n[]\n```  \n"), "[]");
        assert_eq!(strip_code_fence("```json [1] ```"), "[1]");
        assert_eq!(strip_code_fence(" [2] "), "[2]");
    }

    #[test]
    fn test_strip_unclosed_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]"), "[1]");
        assert_eq!(strip_code_fence("```\n[]\n"), "[]");
    }

    #[test]
    fn test_decode_answer_cut_before_closing_fence() {
        let truncated = format!("```json\n{}", ACME);
        let records = decode_records(&truncated).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].brand, "Acme");
    }

    #[test]
    fn test_decode_valid_array() {
        let records = decode_records(ACME).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].brand, "Acme");
        assert_eq!(records[0].date, "2025-02");

        let fenced = format!("```json\n{}\n```", ACME);
        assert_eq!(decode_records(&fenced).unwrap(), records);
        assert!(decode_records("[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_prose() {
        assert!(matches!(
            decode_records("I cannot help with that"),
            Err(DecodeError::NotJson(_))
        ));
        assert!(matches!(decode_records("   "), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_decode_rejects_wrong_shapes() {
        assert!(matches!(decode_records(r#"{"brand":"Acme"}"#), Err(DecodeError::NotArray)));
        assert!(matches!(
            decode_records(r#"["Acme"]"#),
            Err(DecodeError::NotAnObject { index: 0 })
        ));
    }

    #[test]
    fn test_decode_rejects_whole_answer_on_one_bad_element() {
        let raw = r#"[
            {"brand":"Acme","category":"food","description":"X","date":"2025-02","source_url":"http://a"},
            {"brand":"Globex","category":"food","description":"Y","source_url":"http://b"}
        ]"#;
        assert!(matches!(
            decode_records(raw),
            Err(DecodeError::BadElement { index: 1, .. })
        ));

        let not_a_string = r#"[{"brand":"Acme","category":"food","description":"X","date":202502,"source_url":"http://a"}]"#;
        assert!(decode_records(not_a_string).is_err());
    }

    #[tokio::test]
    async fn test_extract_skips_model_without_snippets() {
        let model = ScriptedModel::answering(ACME);
        let out = extract(&model, &RadarConfig::default(), "Foo", &[], today()).await;
        assert!(out.is_empty());
        assert_eq!(model.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_extract_happy_path() {
        let model = ScriptedModel::answering(ACME);
        let out = extract(&model, &RadarConfig::default(), "Foo", &snippets(3), today()).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].brand, "Acme");
        assert_eq!(model.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_extract_degrades_on_refusal() {
        let model = ScriptedModel::answering("I cannot help with that");
        let out = extract(&model, &RadarConfig::default(), "Foo", &snippets(3), today()).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_extract_degrades_on_provider_error() {
        let model = ScriptedModel::failing();
        let out = extract(&model, &RadarConfig::default(), "Foo", &snippets(3), today()).await;
        assert!(out.is_empty());
        assert_eq!(model.calls.get(), 1);
    }
}
