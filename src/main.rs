//! DEX Dashboard demo
//!
//! Opens two contexts on one storage origin, builds a dashboard in the
//! first and waits for the second to pick it up through the sync task.

use dex_dashboard::logging::init_tracing;
use dex_dashboard::widgets::{dropping_layout, DragItem};
use dex_dashboard::{open_storage, spawn_storage_sync, App, Config, Layout};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    init_tracing(&config.logging);

    tracing::info!("DEX Dashboard v{}", env!("CARGO_PKG_VERSION"));

    let storage = open_storage(&config.storage)?;
    let mut tab_a = App::attach(config.clone(), &storage)?;
    let tab_b = Arc::new(Mutex::new(App::attach(config, &storage)?));

    // Tab B re-reads on every notification, like a view would
    let (changed_tx, mut changed_rx) = mpsc::unbounded_channel();
    tab_b
        .lock()
        .map_err(|e| anyhow::anyhow!("app lock poisoned: {}", e))?
        .dashboards_mut()
        .add_event_listener(move || {
            let _ = changed_tx.send(());
        });

    let sync_handle = spawn_storage_sync(Arc::clone(&tab_b));

    let dashboards = tab_a.dashboards_mut();
    let pairs = dashboards.add_dashboard("Pairs")?;
    dashboards.add_widget(&pairs, DragItem::ethereum().into_draft(dropping_layout()))?;
    dashboards.add_widget(
        &pairs,
        DragItem::uniswap_v2_pair_stats("0xb4e16d0168e52d35cacd2c6185b44281ec28c9dc")
            .into_draft(Layout::new(3, 0, 6, 4)),
    )?;
    tracing::info!(dashboard = %pairs, "Tab A built a dashboard");

    // Each notification is a full reload; wait until the last write is visible
    while changed_rx.recv().await.is_some() {
        let tab_b = tab_b
            .lock()
            .map_err(|e| anyhow::anyhow!("app lock poisoned: {}", e))?;
        if tab_b.dashboards().get_widgets(&pairs).map(|w| w.len()).unwrap_or(0) == 2 {
            break;
        }
    }

    {
        let tab_b = tab_b
            .lock()
            .map_err(|e| anyhow::anyhow!("app lock poisoned: {}", e))?;
        for summary in tab_b.dashboards().list_dashboards() {
            let widgets = tab_b.dashboards().get_widgets(&summary.id)?;
            tracing::info!(
                dashboard = %summary.id,
                title = %summary.title,
                widgets = widgets.len(),
                revision = tab_b.dashboards().revision(),
                "Tab B sees dashboard"
            );
            for widget in widgets {
                tracing::info!(
                    widget = %widget.id(),
                    widget_type = %widget.widget_type,
                    x = widget.layout.x,
                    y = widget.layout.y,
                    w = widget.layout.w,
                    h = widget.layout.h,
                    "  widget"
                );
            }
        }
    }

    sync_handle.abort();
    tracing::info!("Demo complete");
    Ok(())
}
