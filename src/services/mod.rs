pub mod backend;
pub mod evaluation_service;
pub mod question_service;
pub mod resume_service;
pub mod stt_service;

pub use backend::{HttpBackend, InterviewBackend};
pub use evaluation_service::EvaluationService;
pub use question_service::QuestionService;
pub use resume_service::ResumeService;
pub use stt_service::SttService;
