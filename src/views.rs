//! Page data loaders.
//!
//! Each loader fetches what its page needs and hands a fully typed
//! [`PageContent`] to the shell. Loaders return the underlying error so the
//! navigator can render the page-level error state in one place; partial
//! views are never left behind.

use tracing::debug;

use crate::error::Result;
use crate::gateway::RemoteGateway;
use crate::session::SessionStore;
use crate::shell::{AdminOverview, DashboardSummary, PageContent, Shell};
use crate::types::{ClaimStatus, ItemKind, ItemQuery};

/// Dashboard: three most recent reports of each kind plus the portal-wide
/// item count.
pub async fn load_dashboard(gateway: &dyn RemoteGateway, shell: &dyn Shell) -> Result<()> {
    let lost = gateway
        .list_items(&ItemQuery::of_kind(ItemKind::Lost).with_limit(3))
        .await?;
    let found = gateway
        .list_items(&ItemQuery::of_kind(ItemKind::Found).with_limit(3))
        .await?;
    let total = gateway
        .list_items(&ItemQuery::default().with_limit(1))
        .await?
        .total;

    shell.render_page(PageContent::Dashboard(DashboardSummary {
        recent_lost: lost.items,
        recent_found: found.items,
        total_items: total,
    }));
    Ok(())
}

/// Browse page, optionally pre-filtered to `lost` or `found`.
pub async fn load_browse_items(
    gateway: &dyn RemoteGateway,
    shell: &dyn Shell,
    filter: Option<&str>,
) -> Result<()> {
    let query = match filter {
        Some("lost") => ItemQuery::of_kind(ItemKind::Lost),
        Some("found") => ItemQuery::of_kind(ItemKind::Found),
        _ => ItemQuery::default(),
    };
    let page = gateway.list_items(&query).await?;
    shell.render_page(PageContent::Items {
        page,
        filter: filter.map(str::to_owned),
    });
    Ok(())
}

/// Item detail with its match previews. The matching score comes from the
/// remote service and is display-only; a failed match lookup degrades to an
/// empty strip rather than failing the page.
pub async fn load_item_detail(
    gateway: &dyn RemoteGateway,
    shell: &dyn Shell,
    item_id: &str,
) -> Result<()> {
    let item = gateway.get_item(item_id).await?;
    let matches = match gateway.item_matches(item_id).await {
        Ok(matches) => matches,
        Err(error) => {
            debug!(item = %item_id, %error, "match lookup failed, rendering without matches");
            Vec::new()
        }
    };
    shell.render_page(PageContent::ItemDetail { item, matches });
    Ok(())
}

pub async fn load_my_items(gateway: &dyn RemoteGateway, shell: &dyn Shell) -> Result<()> {
    let items = gateway.my_items().await?;
    shell.render_page(PageContent::MyItems(items));
    Ok(())
}

pub async fn load_matches(
    gateway: &dyn RemoteGateway,
    shell: &dyn Shell,
    item_id: &str,
) -> Result<()> {
    let matches = gateway.item_matches(item_id).await?;
    shell.render_page(PageContent::Matches(matches));
    Ok(())
}

/// Claims page: both directions at once, received first.
pub async fn load_claims(gateway: &dyn RemoteGateway, shell: &dyn Shell) -> Result<()> {
    let received = gateway.received_claims().await?;
    let mine = gateway.my_claims().await?;
    shell.render_page(PageContent::Claims { received, mine });
    Ok(())
}

/// Re-render received claims under a status filter. The filtered set is what
/// gets rendered; `None` shows everything.
pub async fn filter_received_claims(
    gateway: &dyn RemoteGateway,
    shell: &dyn Shell,
    status: Option<ClaimStatus>,
) -> Result<()> {
    let mut received = gateway.received_claims().await?;
    if let Some(status) = status {
        received.retain(|claim| claim.status == status);
    }
    let mine = gateway.my_claims().await?;
    shell.render_page(PageContent::Claims { received, mine });
    Ok(())
}

/// Profile page renders straight from the session store.
pub fn load_profile(session: &SessionStore, shell: &dyn Shell) {
    if let Some(identity) = session.identity() {
        shell.render_page(PageContent::Profile(identity));
    }
}

/// Admin page: stats, users, items, and claims in one load.
pub async fn load_admin(gateway: &dyn RemoteGateway, shell: &dyn Shell) -> Result<()> {
    let stats = gateway.admin_stats().await?;
    let users = gateway.admin_users(1).await?;
    let items = gateway.admin_items().await?;
    let claims = gateway.admin_claims(None).await?;
    shell.render_page(PageContent::Admin(AdminOverview {
        stats,
        users,
        items,
        claims,
    }));
    Ok(())
}

/// Re-render the admin claims table under a status filter. The fetched
/// filtered set is rendered directly.
pub async fn filter_admin_claims(
    gateway: &dyn RemoteGateway,
    shell: &dyn Shell,
    status: Option<ClaimStatus>,
) -> Result<()> {
    let claims = gateway.admin_claims(status).await?;
    shell.render_page(PageContent::AdminClaims(claims));
    Ok(())
}
