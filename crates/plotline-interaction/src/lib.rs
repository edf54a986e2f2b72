pub mod pipeline_api;
pub mod session_api;

pub use crate::pipeline_api::PipelineApi;
pub use crate::session_api::SessionApi;
