//! Wire types for the portal API.
//!
//! Field names match the remote service's snake_case JSON. Most fields are
//! `#[serde(default)]` because the backend omits nulls rather than sending
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::UserIdentity;

/// One entry in the conversation list. Server-authoritative: entries are
/// replaced wholesale on every list load, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub partner_id: String,
    pub partner_username: String,
    /// Preview of the most recent message.
    #[serde(default)]
    pub last_message: String,
    pub last_time: DateTime<Utc>,
    #[serde(default)]
    pub unread_count: u32,
}

/// A single chat message, oldest-first within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_mine: bool,
}

/// Whether an item was reported lost or found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Lost,
    Found,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::Found => "found",
        }
    }
}

/// A reported lost/found item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub item_type: ItemKind,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub reward: Option<String>,
    #[serde(default)]
    pub date_occurred: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A potential counterpart for an item, scored by the remote matching
/// service. The score is display-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    #[serde(flatten)]
    pub item: Item,
    pub score: f32,
}

/// Query parameters for the item listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub item_type: Option<ItemKind>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ItemQuery {
    pub fn of_kind(kind: ItemKind) -> Self {
        Self {
            item_type: Some(kind),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Encode as a URL query string (no leading `?`).
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<String> = Vec::new();
        if let Some(kind) = self.item_type {
            pairs.push(format!("type={}", kind.as_str()));
        }
        if let Some(category) = &self.category {
            pairs.push(format!("category={}", urlencoding::encode(category)));
        }
        if let Some(search) = &self.search {
            pairs.push(format!("search={}", urlencoding::encode(search)));
        }
        if let Some(page) = self.page {
            pairs.push(format!("page={page}"));
        }
        if let Some(limit) = self.limit {
            pairs.push(format!("limit={limit}"));
        }
        pairs.join("&")
    }
}

/// One page of the item listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPage {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

/// Claim review state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Action taken on a pending claim by the item owner or an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimAction {
    Approve,
    Reject,
}

/// A claim on a found item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub item_type: Option<ItemKind>,
    #[serde(default)]
    pub claimer_id: String,
    #[serde(default)]
    pub claimer_username: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub proof_image: Option<String>,
    pub status: ClaimStatus,
    #[serde(default)]
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate portal statistics for the admin overview.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_lost: u64,
    #[serde(default)]
    pub total_found: u64,
    #[serde(default)]
    pub total_resolved: u64,
    #[serde(default)]
    pub total_pending_claims: u64,
    #[serde(default)]
    pub resolution_rate: f32,
}

/// A user row in the admin user table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub items_posted: u64,
    #[serde(default)]
    pub successful_claims: u64,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Signup request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupProfile {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
}

/// Successful login/signup response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthGrant {
    pub token: String,
    pub user: UserIdentity,
}
