//! Application layer for Plotline.
//!
//! This crate provides use case implementations that coordinate between
//! domain and infrastructure layers to implement application-level business logic.

pub mod access_guard;
pub mod bootstrap;
pub mod message_persistor;
pub mod pipeline_runner;
pub mod session_usecase;
pub mod upload_usecase;

pub use access_guard::AccessGuard;
pub use bootstrap::PlotlineClient;
pub use message_persistor::MessagePersistor;
pub use pipeline_runner::{NullObserver, PipelineRunner, RunObserver};
pub use session_usecase::SessionUseCase;
pub use upload_usecase::UploadUseCase;
