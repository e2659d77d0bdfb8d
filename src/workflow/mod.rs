pub mod interview_flow;
pub mod session_ctx;
pub mod turn_controller;

pub use interview_flow::{FlowUpdate, InterviewFlow};
pub use session_ctx::SessionCtx;
pub use turn_controller::{
    elapsed_seconds, Command, Effect, PendingRequest, Step, TurnController, TurnRejection,
    TurnState,
};
