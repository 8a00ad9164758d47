use crate::error::{ProtegoError, Result};
use crate::rest::ApiClient;
use crate::types::*;

impl ApiClient {
    /// GET /api/chat-sessions?userId= - Previous sessions of a user.
    pub async fn chat_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>> {
        let envelope: DataEnvelope<SessionList> = self
            .get("/api/chat-sessions", &[("userId", user_id)])
            .await?;
        Ok(envelope.data.unwrap_or_default().sessions)
    }

    /// POST /api/chat-session/create - Open a session with a first message.
    /// Returns the new session id.
    pub async fn create_chat_session(&self, user_id: &str, initial_message: &str) -> Result<String> {
        if user_id.trim().is_empty() {
            return Err(ProtegoError::Validation("user id is required".into()));
        }
        let initial_message = initial_message.trim();
        if initial_message.is_empty() {
            return Err(ProtegoError::Validation("message must not be blank".into()));
        }
        let envelope: DataEnvelope<CreatedSession> = self
            .post_json(
                "/api/chat-session/create",
                &CreateSessionRequest {
                    user_id,
                    initial_message,
                },
            )
            .await?;
        envelope
            .data
            .map(|d| d.session_id)
            .ok_or_else(|| ProtegoError::Validation("response missing data.sessionId".into()))
    }
}
