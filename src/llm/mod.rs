//! Completion service interface, retry policy and HTTP implementation.

pub mod completion;
pub mod remote;
pub mod retry;

pub use completion::{
    ChatTurn, CompletionService, GenerationParams, MockCompletionService, Role,
};
pub use remote::RemoteCompletionService;
pub use retry::{RetryPolicy, Sleeper, SystemSleeper};
