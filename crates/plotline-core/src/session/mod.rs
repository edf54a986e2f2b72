//! Session domain: conversations, transcript messages, and the remote
//! transcript port.
//!
//! # Module Structure
//!
//! - `model`: `Session`, `Message`, and message metadata
//! - `service`: the `SessionService` port implemented by the API client

mod model;
mod service;

pub use model::{Message, MessageDurability, MessageMetadata, MessageRole, Session};
pub use service::SessionService;
