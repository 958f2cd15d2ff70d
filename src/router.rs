//! Navigation engine: route parsing, authorization guards, view dispatch.
//!
//! Routes form a closed enum so every navigation intent resolves to exactly
//! one known view; unrecognized or malformed locations normalize to the
//! dashboard instead of erroring. Guards re-read the session store on every
//! transition — session state can change between transitions — and a guard
//! failure is a redirect with a notice, never a fault.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::chat::{ChatEngine, ChatView};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::gateway::RemoteGateway;
use crate::session::SessionStore;
use crate::shell::{Notice, PageContent, Shell};
use crate::types::{Credentials, ItemKind, SignupProfile};
use crate::views;

/// One view of the application, with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Login,
    Signup,
    PostLost,
    PostFound,
    BrowseItems { filter: Option<String> },
    ItemDetail { id: String },
    MyItems,
    Matches { id: String },
    Claims,
    Chat { partner_id: Option<String> },
    Profile,
    Admin,
}

/// Privilege required to enter a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    User,
    Admin,
}

impl Route {
    /// Parse a location string of the form `/<name>/<optional param>`.
    ///
    /// An optional leading `#` is tolerated so hash-style locations can be
    /// fed in unchanged. Empty and unknown paths map to the dashboard, as do
    /// detail routes missing their required parameter.
    pub fn parse(location: &str) -> Self {
        let path = location.trim().trim_start_matches('#');
        let mut parts = path.split('/').filter(|p| !p.is_empty());
        let name = parts.next().unwrap_or("");
        let param = parts.next().map(str::to_owned);

        match name {
            "" | "dashboard" => Self::Dashboard,
            "login" => Self::Login,
            "signup" => Self::Signup,
            "post-lost" => Self::PostLost,
            "post-found" => Self::PostFound,
            "items" => Self::BrowseItems { filter: param },
            "item" => match param {
                Some(id) => Self::ItemDetail { id },
                None => Self::Dashboard,
            },
            "my-items" => Self::MyItems,
            "matches" => match param {
                Some(id) => Self::Matches { id },
                None => Self::Dashboard,
            },
            "claims" => Self::Claims,
            "chat" => Self::Chat { partner_id: param },
            "profile" => Self::Profile,
            "admin" => Self::Admin,
            _ => Self::Dashboard,
        }
    }

    /// Privilege required to enter this route.
    pub fn access(&self) -> Access {
        match self {
            Self::Dashboard | Self::Login | Self::Signup => Access::Public,
            Self::BrowseItems { .. } | Self::ItemDetail { .. } => Access::Public,
            Self::PostLost
            | Self::PostFound
            | Self::MyItems
            | Self::Matches { .. }
            | Self::Claims
            | Self::Chat { .. }
            | Self::Profile => Access::User,
            Self::Admin => Access::Admin,
        }
    }

    /// Canonical location string, used for chrome highlighting and logs.
    pub fn location(&self) -> String {
        match self {
            Self::Dashboard => "/dashboard".to_owned(),
            Self::Login => "/login".to_owned(),
            Self::Signup => "/signup".to_owned(),
            Self::PostLost => "/post-lost".to_owned(),
            Self::PostFound => "/post-found".to_owned(),
            Self::BrowseItems { filter: None } => "/items".to_owned(),
            Self::BrowseItems {
                filter: Some(filter),
            } => format!("/items/{filter}"),
            Self::ItemDetail { id } => format!("/item/{id}"),
            Self::MyItems => "/my-items".to_owned(),
            Self::Matches { id } => format!("/matches/{id}"),
            Self::Claims => "/claims".to_owned(),
            Self::Chat { partner_id: None } => "/chat".to_owned(),
            Self::Chat {
                partner_id: Some(partner_id),
            } => format!("/chat/{partner_id}"),
            Self::Profile => "/profile".to_owned(),
            Self::Admin => "/admin".to_owned(),
        }
    }
}

/// Owns the current route and drives transitions end to end: parse, guard,
/// chrome, view load, and chat engine teardown on the way out.
pub struct Navigator {
    config: ClientConfig,
    session: Arc<SessionStore>,
    gateway: Arc<dyn RemoteGateway>,
    shell: Arc<dyn Shell>,
    chat_view: Arc<dyn ChatView>,
    current: Route,
    chat: Option<Arc<ChatEngine>>,
}

impl Navigator {
    pub fn new(
        config: ClientConfig,
        session: Arc<SessionStore>,
        gateway: Arc<dyn RemoteGateway>,
        shell: Arc<dyn Shell>,
        chat_view: Arc<dyn ChatView>,
    ) -> Self {
        Self {
            config,
            session,
            gateway,
            shell,
            chat_view,
            current: Route::Dashboard,
            chat: None,
        }
    }

    /// The route currently displayed.
    pub fn current_route(&self) -> &Route {
        &self.current
    }

    /// The live chat engine, when the chat view is mounted.
    pub fn chat_engine(&self) -> Option<Arc<ChatEngine>> {
        self.chat.clone()
    }

    /// Process one navigation intent. Always lands on some route: guard
    /// failures redirect, unknown paths normalize, loader failures render an
    /// error page. Navigating to the current route re-runs its loader —
    /// views are not cached.
    pub async fn navigate(&mut self, intent: &str) {
        let requested = Route::parse(intent);
        let route = self.guard(requested);

        // Leaving the chat view (or re-entering it) must cancel the standing
        // poll before anything else happens.
        if let Some(engine) = self.chat.take() {
            engine.shutdown();
        }

        debug!(route = %route.location(), "navigating");
        self.current = route.clone();
        let session = self.session.session();
        self.shell.render_chrome(&route, session.as_ref());
        self.load_view(route).await;
    }

    /// Apply access guards against a fresh session snapshot.
    fn guard(&self, route: Route) -> Route {
        match route.access() {
            Access::Public => route,
            Access::User => {
                if self.session.is_authenticated() {
                    route
                } else {
                    self.shell
                        .show_notice(Notice::error("Please login to continue"));
                    Route::Login
                }
            }
            Access::Admin => {
                if !self.session.is_authenticated() {
                    self.shell
                        .show_notice(Notice::error("Please login to continue"));
                    Route::Login
                } else if !self.session.is_admin() {
                    self.shell
                        .show_notice(Notice::error("Admin access required"));
                    Route::Dashboard
                } else {
                    route
                }
            }
        }
    }

    async fn load_view(&mut self, route: Route) {
        let shell = Arc::clone(&self.shell);
        let gateway = Arc::clone(&self.gateway);
        let result = match &route {
            Route::Login => {
                shell.render_page(PageContent::Login);
                Ok(())
            }
            Route::Signup => {
                shell.render_page(PageContent::Signup);
                Ok(())
            }
            Route::Dashboard => views::load_dashboard(gateway.as_ref(), shell.as_ref()).await,
            Route::PostLost => {
                shell.render_page(PageContent::PostItem(ItemKind::Lost));
                Ok(())
            }
            Route::PostFound => {
                shell.render_page(PageContent::PostItem(ItemKind::Found));
                Ok(())
            }
            Route::BrowseItems { filter } => {
                views::load_browse_items(gateway.as_ref(), shell.as_ref(), filter.as_deref()).await
            }
            Route::ItemDetail { id } => {
                views::load_item_detail(gateway.as_ref(), shell.as_ref(), id).await
            }
            Route::MyItems => views::load_my_items(gateway.as_ref(), shell.as_ref()).await,
            Route::Matches { id } => {
                views::load_matches(gateway.as_ref(), shell.as_ref(), id).await
            }
            Route::Claims => views::load_claims(gateway.as_ref(), shell.as_ref()).await,
            Route::Profile => {
                views::load_profile(&self.session, shell.as_ref());
                Ok(())
            }
            Route::Admin => views::load_admin(gateway.as_ref(), shell.as_ref()).await,
            Route::Chat { partner_id } => {
                self.load_chat(partner_id.clone()).await;
                Ok(())
            }
        };

        if let Err(error) = result {
            warn!(route = %route.location(), %error, "view load failed");
            self.shell.render_page(PageContent::Error {
                message: error.user_message(),
            });
        }
    }

    /// Mount the chat view: fresh engine, conversation list, and — when the
    /// route names a partner — an immediate open.
    async fn load_chat(&mut self, partner_id: Option<String>) {
        self.shell.render_page(PageContent::Chat);

        let engine = Arc::new(ChatEngine::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.chat_view),
            Arc::clone(&self.shell),
            self.config.chat.clone(),
        ));
        self.chat = Some(Arc::clone(&engine));

        if let Err(error) = engine.load_conversation_list().await {
            warn!(%error, "conversation list load failed");
        }

        if let Some(partner_id) = partner_id {
            let label = engine.partner_label(&partner_id).unwrap_or_default();
            if let Err(error) = engine.open_conversation(&partner_id, &label).await {
                warn!(partner = %partner_id, %error, "initial conversation load failed");
            }
        }
    }

    /// Log in, store the session, and land on the dashboard. On failure the
    /// session is untouched and the error is returned for inline rendering.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        crate::auth::login(
            self.gateway.as_ref(),
            &self.session,
            self.shell.as_ref(),
            credentials,
        )
        .await?;
        self.navigate("/dashboard").await;
        Ok(())
    }

    /// Create an account, store the granted session, and land on the
    /// dashboard.
    pub async fn signup(&mut self, profile: &SignupProfile) -> Result<()> {
        crate::auth::signup(
            self.gateway.as_ref(),
            &self.session,
            self.shell.as_ref(),
            profile,
        )
        .await?;
        self.navigate("/dashboard").await;
        Ok(())
    }

    /// Clear the session and return to the login view.
    pub async fn logout(&mut self) {
        crate::auth::logout(&self.session);
        self.navigate("/login").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_root_map_to_dashboard() {
        assert_eq!(Route::parse(""), Route::Dashboard);
        assert_eq!(Route::parse("/"), Route::Dashboard);
        assert_eq!(Route::parse("#/"), Route::Dashboard);
    }

    #[test]
    fn unknown_paths_normalize_to_dashboard() {
        assert_eq!(Route::parse("/nonsense"), Route::Dashboard);
        assert_eq!(Route::parse("/items2/extra"), Route::Dashboard);
    }

    #[test]
    fn params_are_captured() {
        assert_eq!(
            Route::parse("/items/lost"),
            Route::BrowseItems {
                filter: Some("lost".to_owned())
            }
        );
        assert_eq!(
            Route::parse("/item/42"),
            Route::ItemDetail {
                id: "42".to_owned()
            }
        );
        assert_eq!(
            Route::parse("/chat/u9"),
            Route::Chat {
                partner_id: Some("u9".to_owned())
            }
        );
        assert_eq!(Route::parse("/chat"), Route::Chat { partner_id: None });
    }

    #[test]
    fn detail_routes_without_params_degrade_to_dashboard() {
        assert_eq!(Route::parse("/item"), Route::Dashboard);
        assert_eq!(Route::parse("/matches"), Route::Dashboard);
    }

    #[test]
    fn access_levels() {
        assert_eq!(Route::parse("/items").access(), Access::Public);
        assert_eq!(Route::parse("/claims").access(), Access::User);
        assert_eq!(Route::parse("/admin").access(), Access::Admin);
    }
}
