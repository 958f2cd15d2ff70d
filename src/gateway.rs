//! Remote gateway: the portal API behind a trait.
//!
//! [`RemoteGateway`] is the contract the rest of the core consumes; tests
//! swap in stubs. [`HttpGateway`] is the real implementation: one shared
//! `reqwest` client, bearer token read from the session store per request,
//! and the backend's `{"error": ...}` envelope mapped onto
//! [`TroveError::Remote`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::{Result, TroveError};
use crate::session::SessionStore;
use crate::types::{
    AdminStats, AdminUser, AuthGrant, ChatMessage, Claim, ClaimAction, ClaimStatus, Conversation,
    Credentials, Item, ItemPage, ItemQuery, MatchCandidate, SignupProfile,
};

/// Request/response contract against the remote portal service.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    // Auth
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant>;
    async fn signup(&self, profile: &SignupProfile) -> Result<AuthGrant>;

    // Chat
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;
    /// Full message sequence with `partner_id`, oldest first.
    async fn get_conversation(&self, partner_id: &str) -> Result<Vec<ChatMessage>>;
    /// Ack-only; the sent message is not echoed back. Callers reload to see it.
    async fn send_message(&self, partner_id: &str, content: &str) -> Result<()>;

    // Items
    async fn list_items(&self, query: &ItemQuery) -> Result<ItemPage>;
    async fn get_item(&self, item_id: &str) -> Result<Item>;
    async fn my_items(&self) -> Result<Vec<Item>>;
    async fn item_matches(&self, item_id: &str) -> Result<Vec<MatchCandidate>>;

    // Claims
    async fn my_claims(&self) -> Result<Vec<Claim>>;
    async fn received_claims(&self) -> Result<Vec<Claim>>;
    async fn respond_to_claim(
        &self,
        claim_id: &str,
        action: ClaimAction,
        notes: &str,
    ) -> Result<()>;

    // Admin
    async fn admin_stats(&self) -> Result<AdminStats>;
    async fn admin_users(&self, page: u32) -> Result<Vec<AdminUser>>;
    /// Returns the user's new active state.
    async fn toggle_user(&self, user_id: &str) -> Result<bool>;
    async fn admin_claims(&self, status: Option<ClaimStatus>) -> Result<Vec<Claim>>;
    async fn admin_items(&self) -> Result<Vec<Item>>;
}

/// Error envelope the backend uses for non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

// Response envelopes. The backend wraps collections in named fields.
#[derive(Debug, Deserialize)]
struct ConversationsBody {
    #[serde(default)]
    conversations: Vec<Conversation>,
}

#[derive(Debug, Deserialize)]
struct MessagesBody {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ItemBody {
    item: Item,
}

#[derive(Debug, Deserialize)]
struct ItemsBody {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct MatchesBody {
    #[serde(default)]
    matches: Vec<MatchCandidate>,
}

#[derive(Debug, Deserialize)]
struct ClaimsBody {
    #[serde(default)]
    claims: Vec<Claim>,
}

#[derive(Debug, Deserialize)]
struct StatsBody {
    stats: AdminStats,
}

#[derive(Debug, Deserialize)]
struct UsersBody {
    #[serde(default)]
    users: Vec<AdminUser>,
}

#[derive(Debug, Deserialize)]
struct ToggleBody {
    is_active: bool,
}

/// HTTP implementation of [`RemoteGateway`].
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
    session: Arc<SessionStore>,
}

impl HttpGateway {
    pub fn new(config: &ApiConfig, session: Arc<SessionStore>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            client,
            session,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let mut builder = self.client.request(method, url);
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        Self::decode(response).await
    }

    async fn post_json<B: serde::Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn put_json<B: serde::Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .request(reqwest::Method::PUT, path)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Map a response onto `T`, surfacing the backend's `error` field for
    /// non-2xx statuses and falling back to the bare status code when the
    /// body is not the expected envelope.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("HTTP error {}", status.as_u16()),
        };
        Err(TroveError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant> {
        self.post_json("/auth/login", credentials).await
    }

    async fn signup(&self, profile: &SignupProfile) -> Result<AuthGrant> {
        self.post_json("/auth/signup", profile).await
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let body: ConversationsBody = self.get_json("/chat/conversations").await?;
        Ok(body.conversations)
    }

    async fn get_conversation(&self, partner_id: &str) -> Result<Vec<ChatMessage>> {
        let path = format!("/chat/conversation/{}", urlencoding::encode(partner_id));
        let body: MessagesBody = self.get_json(&path).await?;
        Ok(body.messages)
    }

    async fn send_message(&self, partner_id: &str, content: &str) -> Result<()> {
        let body = serde_json::json!({
            "receiver_id": partner_id,
            "content": content,
        });
        let _: serde_json::Value = self.post_json("/chat/send", &body).await?;
        Ok(())
    }

    async fn list_items(&self, query: &ItemQuery) -> Result<ItemPage> {
        let query_string = query.to_query_string();
        let path = if query_string.is_empty() {
            "/items/all".to_owned()
        } else {
            format!("/items/all?{query_string}")
        };
        self.get_json(&path).await
    }

    async fn get_item(&self, item_id: &str) -> Result<Item> {
        let path = format!("/items/{}", urlencoding::encode(item_id));
        let body: ItemBody = self.get_json(&path).await?;
        Ok(body.item)
    }

    async fn my_items(&self) -> Result<Vec<Item>> {
        let body: ItemsBody = self.get_json("/items/my-items").await?;
        Ok(body.items)
    }

    async fn item_matches(&self, item_id: &str) -> Result<Vec<MatchCandidate>> {
        let path = format!("/items/{}/matches", urlencoding::encode(item_id));
        let body: MatchesBody = self.get_json(&path).await?;
        Ok(body.matches)
    }

    async fn my_claims(&self) -> Result<Vec<Claim>> {
        let body: ClaimsBody = self.get_json("/claims/my-claims").await?;
        Ok(body.claims)
    }

    async fn received_claims(&self) -> Result<Vec<Claim>> {
        let body: ClaimsBody = self.get_json("/claims/received").await?;
        Ok(body.claims)
    }

    async fn respond_to_claim(
        &self,
        claim_id: &str,
        action: ClaimAction,
        notes: &str,
    ) -> Result<()> {
        let path = format!("/claims/{}/respond", urlencoding::encode(claim_id));
        let body = serde_json::json!({
            "action": action,
            "notes": notes,
        });
        let _: serde_json::Value = self.put_json(&path, &body).await?;
        Ok(())
    }

    async fn admin_stats(&self) -> Result<AdminStats> {
        let body: StatsBody = self.get_json("/admin/dashboard").await?;
        Ok(body.stats)
    }

    async fn admin_users(&self, page: u32) -> Result<Vec<AdminUser>> {
        let body: UsersBody = self.get_json(&format!("/admin/users?page={page}")).await?;
        Ok(body.users)
    }

    async fn toggle_user(&self, user_id: &str) -> Result<bool> {
        let path = format!("/admin/users/{}/toggle", urlencoding::encode(user_id));
        let body: ToggleBody = self.put_json(&path, &serde_json::json!({})).await?;
        Ok(body.is_active)
    }

    async fn admin_claims(&self, status: Option<ClaimStatus>) -> Result<Vec<Claim>> {
        let path = match status {
            Some(status) => format!("/admin/claims?status={}", status.as_str()),
            None => "/admin/claims".to_owned(),
        };
        let body: ClaimsBody = self.get_json(&path).await?;
        Ok(body.claims)
    }

    async fn admin_items(&self) -> Result<Vec<Item>> {
        let body: ItemsBody = self.get_json("/admin/items").await?;
        Ok(body.items)
    }
}
