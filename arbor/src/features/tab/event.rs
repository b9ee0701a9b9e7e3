use arbor_engine::action::{CloseTabMode, GotoTab, ProgressState};
use arbor_ui_term::SurfaceView;
use flume::Sender;

use super::model::TabId;

/// Surface callbacks queued for the tab manager.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TabEvent {
    SetTitle { tab_id: TabId, title: String },
    CloseRequested { tab_id: TabId, process_alive: bool },
    Progress { tab_id: TabId, state: ProgressState },
    Notification { tab_id: TabId, title: String, body: String },
    NewTab { tab_id: TabId },
    CloseTab { tab_id: TabId, mode: CloseTabMode },
    GotoTab { target: GotoTab },
}

/// Route the bridge callbacks of `view` into `sender`.
pub(crate) fn wire_callbacks(
    view: &mut SurfaceView,
    tab_id: TabId,
    sender: &Sender<TabEvent>,
) {
    let bridge = view.bridge_mut();

    let tx = sender.clone();
    bridge.on_title_change(move |title| {
        let _ = tx.send(TabEvent::SetTitle { tab_id, title });
    });

    let tx = sender.clone();
    bridge.on_close_request(move |process_alive| {
        let _ = tx.send(TabEvent::CloseRequested {
            tab_id,
            process_alive,
        });
    });

    let tx = sender.clone();
    bridge.on_progress_report(move |state| {
        let _ = tx.send(TabEvent::Progress { tab_id, state });
    });

    let tx = sender.clone();
    bridge.on_desktop_notification(move |title, body| {
        let _ = tx.send(TabEvent::Notification {
            tab_id,
            title,
            body,
        });
    });

    let tx = sender.clone();
    bridge.on_new_tab(move || tx.send(TabEvent::NewTab { tab_id }).is_ok());

    let tx = sender.clone();
    bridge.on_close_tab(move |mode| {
        tx.send(TabEvent::CloseTab { tab_id, mode }).is_ok()
    });

    let tx = sender.clone();
    bridge.on_goto_tab(move |target| {
        if !goto_supported(target) {
            return false;
        }
        tx.send(TabEvent::GotoTab { target }).is_ok()
    });
}

/// Previous, next, last and non-negative indices are handled.
fn goto_supported(target: GotoTab) -> bool {
    target.0 >= 0
        || target == GotoTab::PREVIOUS
        || target == GotoTab::NEXT
        || target == GotoTab::LAST
}
