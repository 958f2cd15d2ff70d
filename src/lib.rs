//! Trove: headless client core for a lost & found portal.
//!
//! The crate owns the two stateful parts of the client — which view is
//! active and whether the viewer may see it, and keeping a two-party
//! conversation consistent under polling — while everything user-visible
//! stays behind trait seams the embedder implements.
//!
//! # Architecture
//!
//! - **Session store**: process-wide token + identity, read by every guard
//! - **Navigation engine**: closed route enum, access guards, view dispatch
//! - **Remote gateway**: the portal API behind a trait, `reqwest` underneath
//! - **Conversation sync engine**: active target, poll loop, stale-response
//!   guards, scroll-intent preservation
//!
//! The embedder implements [`Shell`](shell::Shell) for page rendering and
//! notices, and [`ChatView`](chat::ChatView) for the chat pane, then drives
//! everything through [`Navigator`](router::Navigator).

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod router;
pub mod session;
pub mod shell;
pub mod types;
pub mod views;

pub use chat::{ChatEngine, ChatView};
pub use config::ClientConfig;
pub use error::{Result, TroveError};
pub use gateway::{HttpGateway, RemoteGateway};
pub use router::{Navigator, Route};
pub use session::{Role, Session, SessionStore, UserIdentity};
pub use shell::{Notice, NoticeLevel, PageContent, Shell};
