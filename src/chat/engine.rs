//! Engine state and the poll loop.
//!
//! Concurrency model: every network call is a suspension point, and the
//! active target can change while a request is in flight. The engine
//! therefore treats state-at-request-time and state-at-response-time as
//! different things. Each target switch bumps a generation counter and every
//! load captures (generation, issue sequence) when it starts; a response is
//! applied only when the generation still matches and no later-issued
//! response has already been applied. Cancellation only stops the poll
//! timer — an already-dispatched request is made harmless by the apply-time
//! check, not by aborting the transport.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::chat::ChatView;
use crate::config::ChatConfig;
use crate::error::Result;
use crate::gateway::RemoteGateway;
use crate::shell::{Notice, Shell};
use crate::types::Conversation;

#[derive(Default)]
struct EngineState {
    conversations: Vec<Conversation>,
    active_target: Option<String>,
    /// Bumped on every target switch; loads carry the value they started
    /// under and stale ones are discarded at apply time.
    generation: u64,
    /// Issue-order sequence of message loads within the engine's lifetime.
    issue_seq: u64,
    /// Highest sequence whose response has been rendered.
    applied_seq: u64,
    poll_cancel: Option<CancellationToken>,
}

/// Owns the conversation list, the active chat target, and the refresh poll.
pub struct ChatEngine {
    gateway: Arc<dyn RemoteGateway>,
    view: Arc<dyn ChatView>,
    shell: Arc<dyn Shell>,
    config: ChatConfig,
    state: Mutex<EngineState>,
}

impl ChatEngine {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        view: Arc<dyn ChatView>,
        shell: Arc<dyn Shell>,
        config: ChatConfig,
    ) -> Self {
        Self {
            gateway,
            view,
            shell,
            config,
            state: Mutex::new(EngineState::default()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The partner currently displayed, if any.
    pub fn active_target(&self) -> Option<String> {
        self.lock_state().active_target.clone()
    }

    /// Whether a poll timer is currently installed.
    pub fn has_active_poll(&self) -> bool {
        self.lock_state().poll_cancel.is_some()
    }

    /// Display name for a partner, from the last loaded conversation list.
    pub fn partner_label(&self, partner_id: &str) -> Option<String> {
        self.lock_state()
            .conversations
            .iter()
            .find(|c| c.partner_id == partner_id)
            .map(|c| c.partner_username.clone())
    }

    fn is_active_target(&self, partner_id: &str) -> bool {
        self.lock_state().active_target.as_deref() == Some(partner_id)
    }

    /// Fetch and replace the conversation list wholesale. Ordering and
    /// unread counts are server-authoritative, so entries are never merged.
    pub async fn load_conversation_list(&self) -> Result<()> {
        match self.gateway.list_conversations().await {
            Ok(conversations) => {
                self.view.render_conversations(&conversations);
                self.lock_state().conversations = conversations;
                Ok(())
            }
            Err(error) => {
                self.view.render_conversation_list_error();
                Err(error)
            }
        }
    }

    /// Switch the active conversation to `partner_id`.
    ///
    /// Cancels any standing poll first, so at most one timer exists at any
    /// time, then runs an immediate non-silent load and installs the
    /// recurring silent refresh. The poll is installed even when the initial
    /// load fails — the next tick retries naturally.
    pub async fn open_conversation(
        self: &Arc<Self>,
        partner_id: &str,
        partner_label: &str,
    ) -> Result<()> {
        {
            let mut state = self.lock_state();
            if let Some(cancel) = state.poll_cancel.take() {
                cancel.cancel();
            }
            state.active_target = Some(partner_id.to_owned());
            state.generation += 1;
        }

        self.view.mark_active_conversation(partner_id);
        self.view.show_partner(partner_label);

        let initial = self.load_messages(partner_id, false).await;

        let cancel = CancellationToken::new();
        self.lock_state().poll_cancel = Some(cancel.clone());
        let engine = Arc::clone(self);
        let partner = partner_id.to_owned();
        let interval = Duration::from_secs(self.config.poll_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        // A stale timer must never refresh a different
                        // target after a switch.
                        if !engine.is_active_target(&partner) {
                            break;
                        }
                        if let Err(error) = engine.load_messages(&partner, true).await {
                            debug!(partner = %partner, %error, "silent refresh failed, keeping last good view");
                        }
                    }
                }
            }
        });

        initial
    }

    /// Fetch and render the full message sequence for `partner_id`.
    ///
    /// Silent loads show no loading chrome and never surface failures; the
    /// view keeps its last-known-good content. Scroll is pinned back to the
    /// bottom only when the user was already at the live edge or the load
    /// was user-initiated — a background refresh must not yank a reader out
    /// of the scrollback.
    pub async fn load_messages(&self, partner_id: &str, silent: bool) -> Result<()> {
        let (generation, seq) = {
            let mut state = self.lock_state();
            state.issue_seq += 1;
            (state.generation, state.issue_seq)
        };

        if !silent {
            self.view.show_message_loading();
        }

        match self.gateway.get_conversation(partner_id).await {
            Ok(messages) => {
                {
                    let mut state = self.lock_state();
                    if state.generation != generation
                        || state.active_target.as_deref() != Some(partner_id)
                    {
                        debug!(partner = %partner_id, "discarding response for stale target");
                        return Ok(());
                    }
                    if seq < state.applied_seq {
                        debug!(partner = %partner_id, "discarding out-of-order response");
                        return Ok(());
                    }
                    state.applied_seq = seq;
                }

                if messages.is_empty() {
                    self.view.render_empty_conversation();
                    return Ok(());
                }

                let was_at_bottom = self.view.is_near_bottom();
                self.view.render_messages(&messages);
                if was_at_bottom || !silent {
                    self.view.scroll_to_bottom();
                }
                Ok(())
            }
            Err(error) => {
                if !silent && self.is_current(generation, partner_id) {
                    self.view.render_message_load_error();
                }
                Err(error)
            }
        }
    }

    fn is_current(&self, generation: u64, partner_id: &str) -> bool {
        let state = self.lock_state();
        state.generation == generation && state.active_target.as_deref() == Some(partner_id)
    }

    /// Send `content` to the active target.
    ///
    /// Empty or whitespace-only content is a no-op: no request, input
    /// untouched. Otherwise the input is cleared immediately; on success the
    /// authoritative sequence is reloaded silently (never an optimistic local
    /// append), on failure the content is restored and a single notice shown.
    /// No automatic retry.
    pub async fn send(&self, content: &str) -> Result<()> {
        let Some(partner_id) = self.active_target() else {
            return Ok(());
        };
        let content = content.trim();
        if content.is_empty() {
            return Ok(());
        }

        self.view.clear_input();
        match self.gateway.send_message(&partner_id, content).await {
            Ok(()) => {
                if let Err(error) = self.load_messages(&partner_id, true).await {
                    debug!(partner = %partner_id, %error, "post-send refresh failed");
                }
                Ok(())
            }
            Err(error) => {
                self.view.restore_input(content);
                self.shell
                    .show_notice(Notice::error("Failed to send message"));
                Err(error)
            }
        }
    }

    /// Tear the engine down: cancel the poll unconditionally and forget the
    /// active target. Called on every navigation away from the chat view; a
    /// leaked timer would keep issuing requests against a dead view.
    pub fn shutdown(&self) {
        let mut state = self.lock_state();
        if let Some(cancel) = state.poll_cancel.take() {
            cancel.cancel();
        }
        state.active_target = None;
    }
}

impl Drop for ChatEngine {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(cancel) = state.poll_cancel.take() {
                cancel.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::error::TroveError;
    use crate::shell::PageContent;
    use crate::types::ChatMessage;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn message(content: &str, is_mine: bool) -> ChatMessage {
        ChatMessage {
            content: content.to_owned(),
            created_at: Utc::now(),
            is_mine,
        }
    }

    /// Gateway stub serving canned per-partner message sets.
    struct StubGateway {
        messages: Mutex<Vec<(String, Vec<ChatMessage>)>>,
        fail_sends: AtomicBool,
        send_count: AtomicUsize,
        fetch_count: AtomicUsize,
        /// When non-zero, the next fetch snapshots its result and then stalls
        /// this many milliseconds before returning, simulating a slow
        /// in-flight request.
        delay_next_fetch_ms: AtomicUsize,
    }

    impl StubGateway {
        fn new() -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
                fail_sends: AtomicBool::new(false),
                send_count: AtomicUsize::new(0),
                fetch_count: AtomicUsize::new(0),
                delay_next_fetch_ms: AtomicUsize::new(0),
            }
        }

        fn with_conversation(self, partner_id: &str, messages: Vec<ChatMessage>) -> Self {
            self.set_conversation(partner_id, messages);
            self
        }

        fn set_conversation(&self, partner_id: &str, messages: Vec<ChatMessage>) {
            let mut store = self.messages.lock().unwrap();
            if let Some(entry) = store.iter_mut().find(|(id, _)| id == partner_id) {
                entry.1 = messages;
            } else {
                store.push((partner_id.to_owned(), messages));
            }
        }
    }

    #[async_trait]
    impl RemoteGateway for StubGateway {
        async fn login(
            &self,
            _credentials: &crate::types::Credentials,
        ) -> Result<crate::types::AuthGrant> {
            Err(TroveError::Auth("not implemented in stub".to_owned()))
        }

        async fn signup(
            &self,
            _profile: &crate::types::SignupProfile,
        ) -> Result<crate::types::AuthGrant> {
            Err(TroveError::Auth("not implemented in stub".to_owned()))
        }

        async fn list_conversations(&self) -> Result<Vec<Conversation>> {
            Ok(Vec::new())
        }

        async fn get_conversation(&self, partner_id: &str) -> Result<Vec<ChatMessage>> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            let snapshot = self
                .messages
                .lock()
                .unwrap()
                .iter()
                .find(|(id, _)| id == partner_id)
                .map(|(_, msgs)| msgs.clone())
                .unwrap_or_default();
            let delay_ms = self.delay_next_fetch_ms.swap(0, Ordering::SeqCst);
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
            }
            Ok(snapshot)
        }

        async fn send_message(&self, _partner_id: &str, _content: &str) -> Result<()> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(TroveError::Remote {
                    status: 500,
                    message: "boom".to_owned(),
                });
            }
            Ok(())
        }

        async fn list_items(
            &self,
            _query: &crate::types::ItemQuery,
        ) -> Result<crate::types::ItemPage> {
            Ok(crate::types::ItemPage::default())
        }

        async fn get_item(&self, _item_id: &str) -> Result<crate::types::Item> {
            Err(TroveError::Remote {
                status: 404,
                message: "not found".to_owned(),
            })
        }

        async fn my_items(&self) -> Result<Vec<crate::types::Item>> {
            Ok(Vec::new())
        }

        async fn item_matches(
            &self,
            _item_id: &str,
        ) -> Result<Vec<crate::types::MatchCandidate>> {
            Ok(Vec::new())
        }

        async fn my_claims(&self) -> Result<Vec<crate::types::Claim>> {
            Ok(Vec::new())
        }

        async fn received_claims(&self) -> Result<Vec<crate::types::Claim>> {
            Ok(Vec::new())
        }

        async fn respond_to_claim(
            &self,
            _claim_id: &str,
            _action: crate::types::ClaimAction,
            _notes: &str,
        ) -> Result<()> {
            Ok(())
        }

        async fn admin_stats(&self) -> Result<crate::types::AdminStats> {
            Ok(crate::types::AdminStats::default())
        }

        async fn admin_users(&self, _page: u32) -> Result<Vec<crate::types::AdminUser>> {
            Ok(Vec::new())
        }

        async fn toggle_user(&self, _user_id: &str) -> Result<bool> {
            Ok(true)
        }

        async fn admin_claims(
            &self,
            _status: Option<crate::types::ClaimStatus>,
        ) -> Result<Vec<crate::types::Claim>> {
            Ok(Vec::new())
        }

        async fn admin_items(&self) -> Result<Vec<crate::types::Item>> {
            Ok(Vec::new())
        }
    }

    /// Recording view with a scriptable scroll position.
    #[derive(Default)]
    struct RecordingView {
        near_bottom: AtomicBool,
        scrolled_to_bottom: AtomicUsize,
        rendered: Mutex<Vec<Vec<ChatMessage>>>,
        empty_renders: AtomicUsize,
        error_renders: AtomicUsize,
        loading_shown: AtomicUsize,
        input: Mutex<String>,
    }

    impl RecordingView {
        fn at_bottom() -> Self {
            let view = Self::default();
            view.near_bottom.store(true, Ordering::SeqCst);
            view
        }

        fn last_rendered(&self) -> Option<Vec<ChatMessage>> {
            self.rendered.lock().unwrap().last().cloned()
        }
    }

    impl ChatView for RecordingView {
        fn render_conversations(&self, _conversations: &[Conversation]) {}
        fn render_conversation_list_error(&self) {}
        fn mark_active_conversation(&self, _partner_id: &str) {}
        fn show_partner(&self, _label: &str) {}

        fn show_message_loading(&self) {
            self.loading_shown.fetch_add(1, Ordering::SeqCst);
        }

        fn render_messages(&self, messages: &[ChatMessage]) {
            self.rendered.lock().unwrap().push(messages.to_vec());
        }

        fn render_empty_conversation(&self) {
            self.empty_renders.fetch_add(1, Ordering::SeqCst);
        }

        fn render_message_load_error(&self) {
            self.error_renders.fetch_add(1, Ordering::SeqCst);
        }

        fn is_near_bottom(&self) -> bool {
            self.near_bottom.load(Ordering::SeqCst)
        }

        fn scroll_to_bottom(&self) {
            self.scrolled_to_bottom.fetch_add(1, Ordering::SeqCst);
        }

        fn clear_input(&self) {
            self.input.lock().unwrap().clear();
        }

        fn restore_input(&self, content: &str) {
            *self.input.lock().unwrap() = content.to_owned();
        }
    }

    /// Shell stub counting notices.
    #[derive(Default)]
    struct StubShell {
        notices: Mutex<Vec<Notice>>,
    }

    impl Shell for StubShell {
        fn show_notice(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
        fn render_chrome(
            &self,
            _route: &crate::router::Route,
            _session: Option<&crate::session::Session>,
        ) {
        }
        fn render_page(&self, _content: PageContent) {}
    }

    struct Harness {
        engine: Arc<ChatEngine>,
        gateway: Arc<StubGateway>,
        view: Arc<RecordingView>,
        shell: Arc<StubShell>,
    }

    fn harness(gateway: StubGateway, view: RecordingView) -> Harness {
        let gateway = Arc::new(gateway);
        let view = Arc::new(view);
        let shell = Arc::new(StubShell::default());
        let engine = Arc::new(ChatEngine::new(
            Arc::clone(&gateway) as Arc<dyn RemoteGateway>,
            Arc::clone(&view) as Arc<dyn ChatView>,
            Arc::clone(&shell) as Arc<dyn Shell>,
            ChatConfig::default(),
        ));
        Harness {
            engine,
            gateway,
            view,
            shell,
        }
    }

    #[tokio::test]
    async fn open_conversation_installs_exactly_one_poll() {
        let h = harness(
            StubGateway::new().with_conversation("bob", vec![message("hi", false)]),
            RecordingView::at_bottom(),
        );

        h.engine.open_conversation("bob", "bob").await.unwrap();
        assert!(h.engine.has_active_poll());
        h.engine.open_conversation("bob", "bob").await.unwrap();
        assert!(h.engine.has_active_poll());

        h.engine.shutdown();
        assert!(!h.engine.has_active_poll());
        assert!(h.engine.active_target().is_none());
    }

    #[tokio::test]
    async fn empty_conversation_renders_empty_state_not_error() {
        let h = harness(
            StubGateway::new().with_conversation("bob", Vec::new()),
            RecordingView::at_bottom(),
        );

        h.engine.open_conversation("bob", "bob").await.unwrap();
        assert_eq!(h.view.empty_renders.load(Ordering::SeqCst), 1);
        assert_eq!(h.view.error_renders.load(Ordering::SeqCst), 0);
        h.engine.shutdown();
    }

    #[tokio::test]
    async fn silent_refresh_preserves_scrollback_position() {
        let h = harness(
            StubGateway::new().with_conversation("bob", vec![message("hi", false)]),
            RecordingView::default(),
        );

        // Non-silent load always pins to the bottom, even from scrolled-up.
        h.engine.open_conversation("bob", "bob").await.unwrap();
        assert_eq!(h.view.scrolled_to_bottom.load(Ordering::SeqCst), 1);

        // Scrolled up: a silent refresh must not move the position.
        h.view.near_bottom.store(false, Ordering::SeqCst);
        h.engine.load_messages("bob", true).await.unwrap();
        assert_eq!(h.view.scrolled_to_bottom.load(Ordering::SeqCst), 1);

        // At the live edge: a silent refresh keeps following.
        h.view.near_bottom.store(true, Ordering::SeqCst);
        h.engine.load_messages("bob", true).await.unwrap();
        assert_eq!(h.view.scrolled_to_bottom.load(Ordering::SeqCst), 2);
        h.engine.shutdown();
    }

    #[tokio::test]
    async fn silent_loads_show_no_loading_chrome() {
        let h = harness(
            StubGateway::new().with_conversation("bob", vec![message("hi", false)]),
            RecordingView::at_bottom(),
        );

        h.engine.open_conversation("bob", "bob").await.unwrap();
        assert_eq!(h.view.loading_shown.load(Ordering::SeqCst), 1);
        h.engine.load_messages("bob", true).await.unwrap();
        assert_eq!(h.view.loading_shown.load(Ordering::SeqCst), 1);
        h.engine.shutdown();
    }

    #[tokio::test]
    async fn response_for_previous_target_is_discarded() {
        let h = harness(
            StubGateway::new()
                .with_conversation("alice", vec![message("from alice", false)])
                .with_conversation("bob", vec![message("from bob", false)]),
            RecordingView::at_bottom(),
        );

        h.engine.open_conversation("alice", "alice").await.unwrap();
        h.engine.open_conversation("bob", "bob").await.unwrap();

        // A load that was in flight for alice completes after the switch to
        // bob; its generation no longer matches and it must not render.
        h.engine.load_messages("alice", true).await.unwrap();

        let last = h.view.last_rendered().expect("something rendered");
        assert_eq!(last[0].content, "from bob");
        h.engine.shutdown();
    }

    #[tokio::test]
    async fn send_with_blank_content_is_a_noop() {
        let h = harness(
            StubGateway::new().with_conversation("bob", vec![message("hi", false)]),
            RecordingView::at_bottom(),
        );
        h.engine.open_conversation("bob", "bob").await.unwrap();

        *h.view.input.lock().unwrap() = "   ".to_owned();
        h.engine.send("   ").await.unwrap();

        assert_eq!(h.gateway.send_count.load(Ordering::SeqCst), 0);
        assert_eq!(h.view.input.lock().unwrap().as_str(), "   ");
        h.engine.shutdown();
    }

    #[tokio::test]
    async fn send_without_active_target_is_a_noop() {
        let h = harness(StubGateway::new(), RecordingView::at_bottom());
        h.engine.send("hello").await.unwrap();
        assert_eq!(h.gateway.send_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_send_restores_input_and_shows_one_notice() {
        let h = harness(
            StubGateway::new().with_conversation("bob", vec![message("hi", false)]),
            RecordingView::at_bottom(),
        );
        h.gateway.fail_sends.store(true, Ordering::SeqCst);
        h.engine.open_conversation("bob", "bob").await.unwrap();
        let renders_before = h.view.rendered.lock().unwrap().len();

        let result = h.engine.send("hello bob").await;
        assert!(result.is_err());
        assert_eq!(h.view.input.lock().unwrap().as_str(), "hello bob");
        assert_eq!(h.shell.notices.lock().unwrap().len(), 1);
        // Message list unchanged: no reload after a failed send.
        assert_eq!(h.view.rendered.lock().unwrap().len(), renders_before);
        h.engine.shutdown();
    }

    #[tokio::test]
    async fn successful_send_reloads_silently() {
        let h = harness(
            StubGateway::new().with_conversation("bob", vec![message("hi", false)]),
            RecordingView::at_bottom(),
        );
        h.engine.open_conversation("bob", "bob").await.unwrap();
        let loading_before = h.view.loading_shown.load(Ordering::SeqCst);
        let renders_before = h.view.rendered.lock().unwrap().len();

        h.engine.send("hello").await.unwrap();

        assert_eq!(h.view.rendered.lock().unwrap().len(), renders_before + 1);
        assert_eq!(h.view.loading_shown.load(Ordering::SeqCst), loading_before);
        h.engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn poll_ticks_on_interval_and_stops_after_shutdown() {
        let h = harness(
            StubGateway::new().with_conversation("bob", vec![message("hi", false)]),
            RecordingView::at_bottom(),
        );
        h.engine.open_conversation("bob", "bob").await.unwrap();
        assert_eq!(h.gateway.fetch_count.load(Ordering::SeqCst), 1);

        // Default interval is 5s; one tick should have fired by 6s.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(h.gateway.fetch_count.load(Ordering::SeqCst), 2);

        h.engine.shutdown();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.gateway.fetch_count.load(Ordering::SeqCst), 2);
        assert!(!h.engine.has_active_poll());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_older_response_never_overwrites_newer_one() {
        let h = harness(
            StubGateway::new().with_conversation("bob", vec![message("v1", false)]),
            RecordingView::at_bottom(),
        );
        h.engine.open_conversation("bob", "bob").await.unwrap();

        // Start a refresh that snapshots "v1" and then stalls in flight.
        h.gateway
            .delay_next_fetch_ms
            .store(1_000, Ordering::SeqCst);
        let slow = tokio::spawn({
            let engine = Arc::clone(&h.engine);
            async move { engine.load_messages("bob", true).await }
        });
        // Let the slow load capture its sequence and reach the stall.
        tokio::task::yield_now().await;

        // A later, faster refresh sees the updated conversation and renders.
        h.gateway
            .set_conversation("bob", vec![message("v2", false)]);
        h.engine.load_messages("bob", true).await.unwrap();
        assert_eq!(h.view.last_rendered().unwrap()[0].content, "v2");

        // The stalled response completes afterwards and must be discarded.
        slow.await.unwrap().unwrap();
        assert_eq!(h.view.last_rendered().unwrap()[0].content, "v2");
        h.engine.shutdown();
    }
}
