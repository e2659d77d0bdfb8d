use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 业务逻辑错误
    #[error("业务错误: {0}")]
    Business(#[from] BusinessError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// API 返回非 2xx 响应
    #[error("API返回错误响应 ({endpoint}): status={status}, detail={detail:?}")]
    BadResponse {
        endpoint: String,
        status: u16,
        detail: Option<String>,
    },
    /// API 返回空结果
    #[error("API返回空结果: {endpoint}")]
    EmptyResponse { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// 面向用户的错误文本，格式与后端约定一致：`Error {status}: {detail}`
    pub fn user_message(&self) -> String {
        match self {
            ApiError::BadResponse { status, detail, .. } => match detail {
                Some(detail) => format!("Error {}: {}", status, detail),
                None => format!("Error {}", status),
            },
            other => other.to_string(),
        }
    }

    /// 后端返回的 detail 字段
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::BadResponse { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 业务逻辑错误
#[derive(Debug, Error)]
pub enum BusinessError {
    /// 只接受 PDF 简历
    #[error("只支持上传 PDF 文件: {file_name}")]
    NotPdf { file_name: String },
    /// 必填字段为空
    #[error("字段不能为空: {field}")]
    MissingField { field: &'static str },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// HTTP 客户端构建失败
    #[error("HTTP客户端构建失败: {source}")]
    HttpClientBuildFailed {
        #[source]
        source: reqwest::Error,
    },
    /// API 根地址不合法
    #[error("API根地址不合法: {url}")]
    InvalidBaseUrl { url: String },
}

// ========== 从常见错误类型转换 ==========

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        AppError::Api(ApiError::RequestFailed {
            endpoint,
            source: err,
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            endpoint: String::new(),
            source: err,
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: err,
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return AppError::File(FileError::NotFound { path });
        }
        AppError::File(FileError::ReadFailed { path, source })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建错误响应
    pub fn bad_response(endpoint: impl Into<String>, status: u16, detail: Option<String>) -> Self {
        AppError::Api(ApiError::BadResponse {
            endpoint: endpoint.into(),
            status,
            detail,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

// ========== 面试过程中的可恢复错误 ==========

/// 面试过程中展示在对话框内的错误
///
/// 全部在触发它的用户操作处被捕获，渲染成一条内联消息，不会中断面试。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterviewError {
    /// 后端会话尚未绑定
    #[error("세션이 준비되지 않았습니다.")]
    SessionNotReady,
    /// 题号超出范围（视为题目已全部结束）
    #[error("질문 범위를 벗어났습니다. (index={index})")]
    OutOfRangeQuestion { index: usize, total: Option<usize> },
    /// 网络错误、非 2xx 响应或 JSON 格式不正确
    #[error("{message}")]
    NetworkOrServer { message: String },
    /// 麦克风/音频文件无权限访问
    #[error("마이크 권한이 거부되었습니다: {message}")]
    MediaPermissionDenied { message: String },
}

impl From<&AppError> for InterviewError {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::Api(api) => InterviewError::NetworkOrServer {
                message: api.user_message(),
            },
            AppError::File(FileError::ReadFailed { path, source })
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                InterviewError::MediaPermissionDenied {
                    message: path.clone(),
                }
            }
            other => InterviewError::NetworkOrServer {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_response_user_message_uses_detail() {
        let err = ApiError::BadResponse {
            endpoint: "evaluate_answer".to_string(),
            status: 500,
            detail: Some("internal".to_string()),
        };
        assert_eq!(err.user_message(), "Error 500: internal");
        assert_eq!(err.detail(), Some("internal"));
    }

    #[test]
    fn test_permission_denied_maps_to_media_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = AppError::file_read_failed("answer.webm", io);
        assert_eq!(
            InterviewError::from(&err),
            InterviewError::MediaPermissionDenied {
                message: "answer.webm".to_string()
            }
        );
    }

    #[test]
    fn test_not_found_is_distinguished() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = AppError::file_read_failed("resume.pdf", io);
        assert!(matches!(err, AppError::File(FileError::NotFound { .. })));
    }
}
