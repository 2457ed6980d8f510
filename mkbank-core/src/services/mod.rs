//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one flow of the client.

pub mod auth;
pub mod dashboard;
pub mod logging;
pub mod session;

pub use auth::{AuthFailure, AuthFlow, AuthState, AuthSuccess};
pub use dashboard::{
    validate_amount, Activation, DashboardController, DashboardOptions, RedirectReason,
    SubmitError, DEFAULT_DEADLINE, INVALID_AMOUNT_MESSAGE,
};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use session::SessionStore;
