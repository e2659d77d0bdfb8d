//! 取题服务 - 业务能力层
//!
//! 只负责"按题号取题"能力，不关心流程

use tracing::{debug, info};

use crate::error::{ApiError, AppError, AppResult};
use crate::infrastructure::HttpExecutor;
use crate::models::{QuestionFetch, QuestionResponse, SessionId};

/// 后端表示"题号越界"时 detail 里出现的文字
const OUT_OF_RANGE_MARKERS: &[&str] = &["범위를 벗어났습니다", "out of range"];

/// 取题服务
pub struct QuestionService {
    executor: HttpExecutor,
}

impl QuestionService {
    pub fn new(executor: HttpExecutor) -> Self {
        Self { executor }
    }

    /// 取第 `index` 题（从1开始）
    ///
    /// 题号越界不是错误，返回 [`QuestionFetch::OutOfRange`]。
    pub async fn fetch(&self, session_id: &SessionId, index: usize) -> AppResult<QuestionFetch> {
        let query = [
            ("session_id", session_id.to_string()),
            ("index", index.to_string()),
        ];

        match self
            .executor
            .get_json::<QuestionResponse>("question/", &query)
            .await
        {
            Ok(response) if response.index > response.total => {
                info!("第 {} 题超出总数 {}，题目已结束", index, response.total);
                Ok(QuestionFetch::OutOfRange {
                    index,
                    total: Some(response.total),
                })
            }
            Ok(response) => {
                debug!(
                    "取题成功 {}/{}: {}",
                    response.index,
                    response.total,
                    crate::utils::truncate_text(&response.question_content, 60)
                );
                Ok(QuestionFetch::Question(response))
            }
            Err(AppError::Api(ApiError::BadResponse { detail: Some(detail), .. }))
                if is_out_of_range(&detail) =>
            {
                info!("第 {} 题超出范围: {}", index, detail);
                Ok(QuestionFetch::OutOfRange { index, total: None })
            }
            Err(e) => Err(e),
        }
    }
}

fn is_out_of_range(detail: &str) -> bool {
    let lower = detail.to_lowercase();
    OUT_OF_RANGE_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_detection() {
        assert!(is_out_of_range("index 6 범위를 벗어났습니다 (total=5)"));
        assert!(is_out_of_range("Question index Out Of Range"));
        assert!(!is_out_of_range("session not found"));
    }
}
