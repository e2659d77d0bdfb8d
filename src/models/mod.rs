pub mod chat;
pub mod evaluation;
pub mod fineval;
pub mod outcome;
pub mod question;
pub mod session;
pub mod stt;

pub use chat::{ChatMessage, Speaker};
pub use evaluation::{
    EndInterviewResponse, EvaluateAnswerRequest, EvaluationPayload, EvaluationRecord,
    InterviewLogEntry, StructuredEvaluation, SubEvaluations, SubScore,
};
pub use fineval::{FinevalCounts, FinevalResponse, FinevalResult, FinevalSession};
pub use outcome::InterviewOutcome;
pub use question::{QuestionFetch, QuestionResponse, QuestionTurn};
pub use session::{
    GeneratedQuestion, InterviewSession, MaskedResume, ResumeFullRequest, ResumeFullResponse,
    SessionId,
};
pub use stt::Transcript;
