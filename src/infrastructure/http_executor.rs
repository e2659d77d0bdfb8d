//! HTTP 执行器 - 基础设施层
//!
//! 持有唯一的 reqwest Client，只暴露"发请求、拿 JSON"的能力

use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, ConfigError};

/// HTTP 执行器
///
/// 职责：
/// - 持有唯一的 Client 资源和后端根地址
/// - 统一处理非 2xx 响应和 `detail` 字段
/// - 不认识 Question / Session
/// - 不处理业务流程
#[derive(Clone)]
pub struct HttpExecutor {
    client: Client,
    base_url: String,
}

impl HttpExecutor {
    /// 创建新的 HTTP 执行器
    pub fn new(config: &Config) -> AppResult<Self> {
        let base_url = config.api_base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl {
                url: config.api_base_url.clone(),
            }
            .into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|source| ConfigError::HttpClientBuildFailed { source })?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET 请求并解析 JSON
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        debug!("GET {} {:?}", path, query);
        let response = self
            .client
            .get(self.url(path))
            .header("accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|source| request_failed(path, source))?;

        read_json(path, response).await
    }

    /// POST JSON 请求体并解析 JSON
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                "POST {} Payload: {}",
                path,
                serde_json::to_string(body).unwrap_or_default()
            );
        }
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|source| request_failed(path, source))?;

        read_json(path, response).await
    }

    /// POST multipart 表单并解析 JSON
    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> AppResult<T> {
        debug!("POST (multipart) {}", path);
        let response = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .map_err(|source| request_failed(path, source))?;

        read_json(path, response).await
    }
}

fn request_failed(endpoint: &str, source: reqwest::Error) -> AppError {
    warn!("请求失败 ({}): {}", endpoint, source);
    ApiError::RequestFailed {
        endpoint: endpoint.to_string(),
        source,
    }
    .into()
}

/// 检查状态码并解析响应体
async fn read_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> AppResult<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|source| request_failed(endpoint, source))?;

    if !status.is_success() {
        warn!(
            "[{}] FAIL {} {}",
            endpoint,
            status.as_u16(),
            crate::utils::truncate_text(&text, 400)
        );
        let detail = extract_detail(&text).or_else(|| {
            let reason = status.canonical_reason().unwrap_or_default();
            let body = crate::utils::truncate_text(text.trim(), 300);
            match (reason.is_empty(), body.is_empty()) {
                (true, true) => None,
                (false, true) => Some(reason.to_string()),
                (true, false) => Some(body),
                (false, false) => Some(format!("{} - {}", reason, body)),
            }
        });
        return Err(AppError::bad_response(endpoint, status.as_u16(), detail));
    }

    if text.trim().is_empty() {
        return Err(ApiError::EmptyResponse {
            endpoint: endpoint.to_string(),
        }
        .into());
    }

    serde_json::from_str(&text).map_err(|source| {
        warn!("[{}] JSON parse error: {}", endpoint, crate::utils::truncate_text(&text, 400));
        AppError::from(ApiError::JsonParseFailed {
            endpoint: endpoint.to_string(),
            source,
        })
    })
}

/// 从错误响应体里取 `detail`
///
/// `detail` 是字符串时原样返回，是其他 JSON 时序列化返回；
/// 没有 `detail` 字段的 JSON 整体序列化；不是 JSON 返回 None。
pub fn extract_detail(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    match value.get("detail").cloned() {
        Some(JsonValue::String(detail)) => Some(detail),
        Some(JsonValue::Null) | None if value.is_null() => None,
        Some(JsonValue::Null) | None => Some(value.to_string()),
        Some(other) => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_detail_string() {
        assert_eq!(
            extract_detail(r#"{"detail": "index 6 범위를 벗어났습니다"}"#).as_deref(),
            Some("index 6 범위를 벗어났습니다")
        );
    }

    #[test]
    fn test_extract_detail_structured() {
        assert_eq!(
            extract_detail(r#"{"detail": [{"loc": ["query", "index"]}]}"#).as_deref(),
            Some(r#"[{"loc":["query","index"]}]"#)
        );
        assert_eq!(
            extract_detail(r#"{"error": "boom"}"#).as_deref(),
            Some(r#"{"error":"boom"}"#)
        );
    }

    #[test]
    fn test_extract_detail_not_json() {
        assert_eq!(extract_detail("<html>Bad Gateway</html>"), None);
    }

    #[test]
    fn test_rejects_base_url_without_scheme() {
        let config = Config {
            api_base_url: "localhost:8000/api".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            HttpExecutor::new(&config),
            Err(AppError::Config(ConfigError::InvalidBaseUrl { .. }))
        ));
    }

    #[test]
    fn test_url_joining() {
        let config = Config {
            api_base_url: "http://localhost:8000/api/".to_string(),
            ..Config::default()
        };
        let executor = HttpExecutor::new(&config).unwrap();
        assert_eq!(executor.url("/question/"), "http://localhost:8000/api/question/");
        assert_eq!(executor.url("fineval"), "http://localhost:8000/api/fineval");
    }
}
