//! REST client for the DealClosed backend.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::models::{
    AnnouncePresenceRequest, Conversation, ConversationListResponse, InboxStreamEvent,
    LoginRequest, LoginResponse, MeResponse, Message, MessageHistoryResponse, SendMessageRequest,
    SendMessageResponse,
};
use uuid::Uuid;

use crate::error::InboxError;

/// Operations the inbox controller needs from the DealClosed backend.
///
/// The controller holds this as a trait object so tests can substitute a
/// double for the network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InboxApi: Send + Sync {
    /// Retrieve the authenticated user's profile.
    ///
    /// # Errors
    /// Fails when the transport errors or the session is rejected.
    async fn profile(&self) -> Result<MeResponse, InboxError>;

    /// List the conversations visible to the authenticated user, in backend
    /// order.
    ///
    /// # Errors
    /// Fails when the transport errors or the request is rejected.
    async fn list_conversations(&self) -> Result<Vec<Conversation>, InboxError>;

    /// Fetch the full persisted history of one conversation.
    ///
    /// # Errors
    /// Fails when the transport errors or the request is rejected.
    async fn message_history(&self, conversation_id: Uuid) -> Result<Vec<Message>, InboxError>;

    /// Persist a message.
    ///
    /// # Errors
    /// Fails when the transport errors or the write is rejected.
    async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageResponse, InboxError>;
}

/// Lightweight API client for DealClosed backend interactions.
#[derive(Clone, Debug)]
pub struct DealClosedClient {
    base_url: String,
    client: Client,
    bearer_token: Arc<Mutex<Option<String>>>,
}

impl DealClosedClient {
    /// Create a new API client with the provided base URL.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            bearer_token: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a client that authenticates with an existing bearer token.
    #[must_use]
    pub fn with_token(base_url: &str, token: impl Into<String>) -> Self {
        let client = Self::new(base_url);
        client.set_bearer_token(Some(token.into()));
        client
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Replace the bearer credential used for subsequent requests.
    pub fn set_bearer_token(&self, token: Option<String>) {
        let mut guard = self
            .bearer_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = token;
    }

    /// The bearer credential currently in use, if any.
    #[must_use]
    pub fn current_bearer_token(&self) -> Option<String> {
        self.bearer_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = self.current_bearer_token() {
            request.bearer_auth(token)
        } else {
            request
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, InboxError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InboxError::Rejected { status, message });
        }
        Ok(response.json().await?)
    }

    async fn expect_success(response: Response) -> Result<(), InboxError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InboxError::Rejected { status, message });
        }
        Ok(())
    }

    /// Authenticate with email/password credentials and store the issued
    /// bearer token on this client.
    ///
    /// # Errors
    /// Fails when the transport errors or the credentials are rejected.
    pub async fn login(&self, payload: &LoginRequest) -> Result<LoginResponse, InboxError> {
        let url = self.api_url("auth/login");
        let response = self.client.post(url).json(payload).send().await?;
        let body: LoginResponse = Self::read_json(response).await?;
        self.set_bearer_token(Some(body.token.clone()));
        Ok(body)
    }

    /// Terminate the current session.
    ///
    /// # Errors
    /// Fails when the transport errors or the request is rejected.
    pub async fn logout(&self) -> Result<(), InboxError> {
        let url = self.api_url("auth/logout");
        let response = self.apply_auth(self.client.post(url)).send().await?;
        Self::expect_success(response).await?;
        self.set_bearer_token(None);
        Ok(())
    }

    /// Announce the user's presence so the live channel routes events here.
    ///
    /// # Errors
    /// Fails when the transport errors or the request is rejected.
    pub async fn announce_presence(&self, user_id: Uuid) -> Result<(), InboxError> {
        let url = self.api_url("realtime/presence");
        let payload = AnnouncePresenceRequest { user_id };
        let response = self
            .apply_auth(self.client.post(url))
            .json(&payload)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    /// Publish an event on the live channel for fan-out to the peer.
    ///
    /// # Errors
    /// Fails when the transport errors or the request is rejected.
    pub async fn publish_event(&self, event: &InboxStreamEvent) -> Result<(), InboxError> {
        let url = self.api_url("realtime/publish");
        let response = self
            .apply_auth(self.client.post(url))
            .json(event)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    /// Open the raw SSE feed for the given user.
    ///
    /// # Errors
    /// Fails when the transport errors or the subscription is rejected.
    pub async fn open_stream(&self, user_id: Uuid) -> Result<Response, InboxError> {
        let url = self.api_url(&format!("realtime/stream/{user_id}"));
        let response = self.apply_auth(self.client.get(url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InboxError::Rejected { status, message });
        }
        Ok(response)
    }
}

#[async_trait]
impl InboxApi for DealClosedClient {
    async fn profile(&self) -> Result<MeResponse, InboxError> {
        let url = self.api_url("auth/me");
        let response = self.apply_auth(self.client.get(url)).send().await?;
        Self::read_json(response).await
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, InboxError> {
        let url = self.api_url("conversations");
        let response = self.apply_auth(self.client.get(url)).send().await?;
        let body: ConversationListResponse = Self::read_json(response).await?;
        Ok(body.conversations)
    }

    async fn message_history(&self, conversation_id: Uuid) -> Result<Vec<Message>, InboxError> {
        let url = self.api_url(&format!("conversations/{conversation_id}/messages"));
        let response = self.apply_auth(self.client.get(url)).send().await?;
        let body: MessageHistoryResponse = Self::read_json(response).await?;
        Ok(body.messages)
    }

    async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageResponse, InboxError> {
        let url = self.api_url("messages");
        let response = self
            .apply_auth(self.client.post(url))
            .json(request)
            .send()
            .await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_normalizes_slashes() {
        let client = DealClosedClient::new("http://localhost:8080/api/");
        assert_eq!(
            client.api_url("/conversations"),
            "http://localhost:8080/api/conversations"
        );
    }

    #[test]
    fn with_token_stores_credential() {
        let client = DealClosedClient::with_token("http://localhost:8080/api", "secret");
        assert_eq!(client.current_bearer_token().as_deref(), Some("secret"));

        client.set_bearer_token(None);
        assert!(client.current_bearer_token().is_none());
    }
}
