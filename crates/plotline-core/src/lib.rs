pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod pipeline;
pub mod retry;
pub mod session;
pub mod state;

// Re-export common error type
pub use error::PlotlineError;
