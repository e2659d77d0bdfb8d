//! 简历服务 - 业务能力层
//!
//! 负责简历脱敏和创建面试会话

use std::path::Path;

use reqwest::multipart::{Form, Part};
use tracing::info;

use crate::error::{AppError, AppResult, BusinessError};
use crate::infrastructure::HttpExecutor;
use crate::models::{InterviewSession, MaskedResume, ResumeFullRequest, ResumeFullResponse};

/// 简历服务
pub struct ResumeService {
    executor: HttpExecutor,
}

impl ResumeService {
    pub fn new(executor: HttpExecutor) -> Self {
        Self { executor }
    }

    /// 上传 PDF 简历，返回脱敏后的文本
    ///
    /// # 参数
    /// - `pdf_path`: PDF 文件路径（只接受 .pdf）
    /// - `target_name`: 需要脱敏的姓名
    pub async fn mask_resume(&self, pdf_path: &Path, target_name: &str) -> AppResult<MaskedResume> {
        let file_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        ensure_pdf(&file_name)?;

        let bytes = tokio::fs::read(pdf_path)
            .await
            .map_err(|e| AppError::file_read_failed(pdf_path.display().to_string(), e))?;

        info!("📄 上传简历 {} ({} 字节)", file_name, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = Form::new()
            .part("file", part)
            .text("target_name", target_name.to_string());

        let masked: MaskedResume = self.executor.post_multipart("resume/mask", form).await?;
        info!(
            "✓ 简历脱敏完成 (engine: {}, {} → {} 字)",
            masked.engine, masked.original_length, masked.masked_length
        );
        Ok(masked)
    }

    /// 提交脱敏后的简历，创建会话并生成题目
    pub async fn create_session(&self, request: ResumeFullRequest) -> AppResult<InterviewSession> {
        validate_request(&request)?;

        info!(
            "🧩 创建面试会话: {} / {} / {}",
            request.user_name, request.company_name, request.jd_name
        );
        let response: ResumeFullResponse = self.executor.post_json("resume/full", &request).await?;
        info!(
            "✓ 会话 {} 已创建，生成 {} 道题",
            response.session_id,
            response.questions.len()
        );

        Ok(InterviewSession::from_response(request, response))
    }
}

fn ensure_pdf(file_name: &str) -> AppResult<()> {
    if file_name.to_lowercase().ends_with(".pdf") {
        Ok(())
    } else {
        Err(BusinessError::NotPdf {
            file_name: file_name.to_string(),
        }
        .into())
    }
}

fn validate_request(request: &ResumeFullRequest) -> AppResult<()> {
    let fields = [
        ("user_name", &request.user_name),
        ("company_name", &request.company_name),
        ("jd_name", &request.jd_name),
        ("resume_text", &request.resume_text),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(BusinessError::MissingField { field }.into());
        }
    }
    Ok(())
}
