use super::Message;
use async_trait::async_trait;

/// Remote transcript operations for sessions.
///
/// Implementations live in the interaction layer; the application layer
/// depends only on this trait so tests can substitute in-memory fakes.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Creates a new session owned by `owner_id`.
    ///
    /// # Arguments
    /// * `owner_id` - Identity of the authenticated user
    ///
    /// # Returns
    /// The server-issued session id.
    async fn create_session(&self, owner_id: &str) -> anyhow::Result<String>;

    /// Fetches the full transcript of a session, oldest first.
    ///
    /// # Arguments
    /// * `session_id` - The session to read
    async fn fetch_messages(&self, session_id: &str) -> anyhow::Result<Vec<Message>>;

    /// Appends one message to the session transcript.
    ///
    /// # Arguments
    /// * `session_id` - The session to append to
    /// * `message` - The message to persist
    async fn append_message(&self, session_id: &str, message: &Message) -> anyhow::Result<()>;

    /// Replaces the session title.
    async fn update_title(&self, session_id: &str, title: &str) -> anyhow::Result<()>;
}
