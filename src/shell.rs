//! Embedder seam for everything user-visible.
//!
//! The core never touches a DOM or terminal directly: the embedding
//! application implements [`Shell`] and renders whatever medium it owns.
//! Page loaders hand over fully typed data via [`PageContent`]; transient
//! notices (toasts) go through [`Shell::show_notice`].

use crate::router::Route;
use crate::session::{Session, UserIdentity};
use crate::types::{AdminStats, AdminUser, Claim, Item, ItemKind, ItemPage, MatchCandidate};

/// Notice severity, mirrored onto whatever toast styling the embedder has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient user-visible notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Data for the dashboard page: a short strip of recent reports per kind
/// plus the portal-wide item count.
#[derive(Debug, Clone, Default)]
pub struct DashboardSummary {
    pub recent_lost: Vec<Item>,
    pub recent_found: Vec<Item>,
    pub total_items: u64,
}

/// Data for the admin page.
#[derive(Debug, Clone, Default)]
pub struct AdminOverview {
    pub stats: AdminStats,
    pub users: Vec<AdminUser>,
    pub items: Vec<Item>,
    pub claims: Vec<Claim>,
}

/// Fully loaded content for one page, ready to render.
///
/// Closed enum so an unhandled page cannot fall through silently; the chat
/// page is absent on purpose — its content is driven incrementally by the
/// conversation sync engine through [`ChatView`](crate::chat::ChatView).
#[derive(Debug, Clone)]
pub enum PageContent {
    Login,
    Signup,
    /// Report form scaffold for a lost or found item. Form handling itself
    /// is the embedder's concern.
    PostItem(ItemKind),
    Dashboard(DashboardSummary),
    /// Browse page; `filter` echoes the status filter from the route.
    Items {
        page: ItemPage,
        filter: Option<String>,
    },
    ItemDetail {
        item: Item,
        matches: Vec<MatchCandidate>,
    },
    MyItems(Vec<Item>),
    Matches(Vec<MatchCandidate>),
    /// Claims the viewer has received on their items, and claims they made.
    Claims {
        received: Vec<Claim>,
        mine: Vec<Claim>,
    },
    Profile(UserIdentity),
    Admin(AdminOverview),
    /// Admin claims table re-rendered under a status filter.
    AdminClaims(Vec<Claim>),
    /// Chat scaffold is mounting; message content follows via the chat view.
    Chat,
    /// A user-initiated load failed; replaces the page, never a partial view.
    Error {
        message: String,
    },
}

/// The embedder's rendering surface.
pub trait Shell: Send + Sync {
    /// Display a transient notice (toast).
    fn show_notice(&self, notice: Notice);

    /// Re-render the persistent navigation chrome. Called on every successful
    /// transition with the now-current route and a fresh session snapshot, so
    /// the link set always reflects login state.
    fn render_chrome(&self, route: &Route, session: Option<&Session>);

    /// Render a fully loaded page.
    fn render_page(&self, content: PageContent);
}
