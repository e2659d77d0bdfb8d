pub mod clock;
pub mod http_executor;

pub use clock::{Clock, SystemClock};
pub use http_executor::HttpExecutor;
