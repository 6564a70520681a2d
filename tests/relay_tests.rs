use std::time::Duration;

use form_inspector::{
    form::form_model::FormSnapshot,
    relay::{
        badge::{Badge, BadgeBoard, BadgeColor},
        coordinator::Coordinator,
        message::{
            ClientMessage, ClientRequest, PageEnvelope, PageMessage, PortRole, SourceCommand,
            SourceMessage,
        },
        port::Port,
        registry::TabId,
        source::{ContextLiveness, ExtensionContext, LinkState, Reconnect, RelaySource},
    },
};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::common::fixtures::bag;

mod common;

const TAB: TabId = TabId(7);

fn forms(n: usize) -> Vec<FormSnapshot> {
    (0..n)
        .map(|i| FormSnapshot::from_payload(&bag(json!({ "field": i })), i).unwrap())
        .collect()
}

fn state_update(n: usize) -> SourceMessage {
    SourceMessage::StateUpdate {
        forms: forms(n),
        timestamp: 1,
    }
}

fn coordinator() -> (Coordinator<BadgeBoard>, BadgeBoard) {
    let board = BadgeBoard::new();
    (Coordinator::new(board.clone()), board)
}

fn source_port() -> (Port<SourceCommand>, UnboundedReceiver<SourceCommand>) {
    Port::channel(PortRole::Source)
}

fn client_port() -> (Port<ClientMessage>, UnboundedReceiver<ClientMessage>) {
    Port::channel(PortRole::Client)
}

fn drain<T>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
    let mut out = vec![];
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

// =========================================================================
// Badge
// =========================================================================

#[test]
fn badge_reflects_form_count() {
    assert_eq!(
        Badge::for_count(3),
        Badge {
            text: "3".into(),
            color: BadgeColor::Active
        }
    );
    assert_eq!(Badge::for_count(0), Badge::neutral());
    assert_eq!(Badge::neutral().text, "");
    assert_eq!(BadgeColor::Active.hex(), "#007bff");
    assert_eq!(BadgeColor::Neutral.hex(), "#6c757d");
}

#[test]
fn port_roles_follow_connection_names() {
    assert_eq!(PortRole::from_name("formik-inspector"), Some(PortRole::Source));
    assert_eq!(PortRole::from_name("popup"), Some(PortRole::Client));
    assert_eq!(PortRole::from_name("devtools"), None);
}

// =========================================================================
// Coordinator: source side
// =========================================================================

#[test]
fn state_update_replaces_cache_and_paints_badge() {
    let (mut c, board) = coordinator();
    let (port, _rx) = source_port();
    c.connect_source(TAB, port.clone());

    c.on_source_message(TAB, &port, state_update(2));
    assert_eq!(c.page(TAB).unwrap().forms().len(), 2);
    assert_eq!(board.get(TAB), Some(Badge::for_count(2)));

    c.on_source_message(TAB, &port, state_update(1));
    assert_eq!(c.page(TAB).unwrap().forms().len(), 1, "Whole-batch replacement");
    assert_eq!(board.get(TAB).unwrap().text, "1");
}

#[test]
fn count_update_does_not_touch_cache_or_badge() {
    let (mut c, board) = coordinator();
    let (port, _rx) = source_port();
    c.connect_source(TAB, port.clone());
    c.on_source_message(TAB, &port, state_update(2));

    c.on_source_message(TAB, &port, SourceMessage::CountUpdate { count: 9 });

    let state = c.page(TAB).unwrap();
    assert_eq!(state.reported_count, Some(9));
    assert_eq!(state.forms().len(), 2);
    assert_eq!(board.get(TAB).unwrap().text, "2");
}

#[test]
fn source_disconnect_resets_tab() {
    let (mut c, board) = coordinator();
    let (port, _rx) = source_port();
    c.connect_source(TAB, port.clone());
    c.on_source_message(TAB, &port, state_update(2));

    c.source_disconnected(TAB, port.id());

    let state = c.page(TAB).unwrap();
    assert!(state.forms().is_empty());
    assert!(!state.source_connected());
    assert_eq!(board.get(TAB), Some(Badge::neutral()));
}

#[test]
fn new_source_supersedes_and_old_disconnect_is_ignored() {
    let (mut c, _board) = coordinator();
    let (old, _old_rx) = source_port();
    let (new, mut new_rx) = source_port();

    c.connect_source(TAB, old.clone());
    c.connect_source(TAB, new.clone());
    c.on_source_message(TAB, &new, state_update(1));

    c.source_disconnected(TAB, old.id());
    assert_eq!(c.page(TAB).unwrap().source_id(), Some(new.id()));
    assert_eq!(c.page(TAB).unwrap().forms().len(), 1);

    c.on_client_request(new.id(), ClientRequest::Refresh);
    assert!(drain(&mut new_rx).is_empty(), "A source port is not a client");
}

#[test]
fn message_sender_becomes_registered_source() {
    let (mut c, _board) = coordinator();
    let (first, _first_rx) = source_port();
    let (second, _second_rx) = source_port();

    c.connect_source(TAB, first);
    c.on_source_message(TAB, &second, state_update(1));

    assert_eq!(c.page(TAB).unwrap().source_id(), Some(second.id()));
}

#[test]
fn failed_command_send_drops_the_source() {
    let (mut c, board) = coordinator();
    let (port, rx) = source_port();
    let (client, _client_rx) = client_port();
    c.set_active_tab(Some(TAB));
    c.connect_source(TAB, port.clone());
    c.on_source_message(TAB, &port, state_update(2));
    drop(rx);

    c.connect_client(client.clone());
    c.on_client_request(client.id(), ClientRequest::Refresh);

    let state = c.page(TAB).unwrap();
    assert!(!state.source_connected());
    assert!(state.forms().is_empty());
    assert_eq!(board.get(TAB), Some(Badge::neutral()));
}

// =========================================================================
// Coordinator: client side
// =========================================================================

#[test]
fn client_gets_cache_first_then_source_is_queried() {
    let (mut c, _board) = coordinator();
    let (source, mut source_rx) = source_port();
    let (client, mut client_rx) = client_port();
    c.set_active_tab(Some(TAB));
    c.connect_source(TAB, source.clone());
    c.on_source_message(TAB, &source, state_update(3));

    assert_eq!(c.connect_client(client), Some(TAB));

    let replies = drain(&mut client_rx);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].forms().len(), 3);
    assert_eq!(drain(&mut source_rx), vec![SourceCommand::QueryCurrentState]);
}

#[test]
fn client_on_empty_tab_gets_empty_batch() {
    let (mut c, _board) = coordinator();
    let (client, mut client_rx) = client_port();
    c.set_active_tab(Some(TAB));

    c.connect_client(client);

    let replies = drain(&mut client_rx);
    assert_eq!(replies.len(), 1);
    assert!(replies[0].forms().is_empty());
}

#[test]
fn client_without_active_tab_is_dropped() {
    let (mut c, _board) = coordinator();
    let (client, mut client_rx) = client_port();

    assert_eq!(c.connect_client(client), None);
    assert!(drain(&mut client_rx).is_empty());
    assert!(c.registry().is_empty());
}

#[test]
fn updates_are_pushed_to_open_client() {
    let (mut c, _board) = coordinator();
    let (source, _source_rx) = source_port();
    let (client, mut client_rx) = client_port();
    c.set_active_tab(Some(TAB));
    c.connect_source(TAB, source.clone());
    c.connect_client(client);
    drain(&mut client_rx);

    c.on_source_message(
        TAB,
        &source,
        SourceMessage::CurrentState {
            forms: forms(2),
            timestamp: 5,
        },
    );

    let pushed = drain(&mut client_rx);
    assert_eq!(pushed.len(), 1);
    assert!(matches!(
        &pushed[0],
        ClientMessage::StateUpdate { timestamp: 5, forms } if forms.len() == 2
    ));
}

#[test]
fn closed_client_is_cleared_on_forward() {
    let (mut c, _board) = coordinator();
    let (source, _source_rx) = source_port();
    let (client, client_rx) = client_port();
    c.set_active_tab(Some(TAB));
    c.connect_source(TAB, source.clone());
    c.connect_client(client);
    drop(client_rx);

    c.on_source_message(TAB, &source, state_update(1));

    let state = c.page(TAB).unwrap();
    assert!(!state.client_connected());
    assert_eq!(state.forms().len(), 1, "Cache still updated");
}

#[test]
fn refresh_without_source_is_silent() {
    let (mut c, _board) = coordinator();
    let (client, mut client_rx) = client_port();
    c.set_active_tab(Some(TAB));
    c.connect_client(client.clone());
    drain(&mut client_rx);

    c.on_client_request(client.id(), ClientRequest::Refresh);

    assert!(drain(&mut client_rx).is_empty());
    assert!(c.page(TAB).unwrap().client_connected());
}

#[test]
fn refresh_is_forwarded_to_source() {
    let (mut c, _board) = coordinator();
    let (source, mut source_rx) = source_port();
    let (client, _client_rx) = client_port();
    c.set_active_tab(Some(TAB));
    c.connect_source(TAB, source);
    c.connect_client(client.clone());
    drain(&mut source_rx);

    c.on_client_request(client.id(), ClientRequest::Refresh);
    c.on_client_request(client.id(), ClientRequest::GetCurrentState);

    assert_eq!(
        drain(&mut source_rx),
        vec![SourceCommand::RefreshCommand, SourceCommand::QueryCurrentState]
    );
}

#[test]
fn client_disconnect_keeps_cache() {
    let (mut c, _board) = coordinator();
    let (source, _source_rx) = source_port();
    let (client, _client_rx) = client_port();
    c.set_active_tab(Some(TAB));
    c.connect_source(TAB, source.clone());
    c.on_source_message(TAB, &source, state_update(2));
    c.connect_client(client.clone());

    c.client_disconnected(client.id());

    let state = c.page(TAB).unwrap();
    assert!(!state.client_connected());
    assert_eq!(state.forms().len(), 2);
}

// =========================================================================
// Coordinator: tab lifecycle
// =========================================================================

#[test]
fn removed_tab_is_evicted_and_late_messages_ignored() {
    let (mut c, board) = coordinator();
    let (source, _source_rx) = source_port();
    c.set_active_tab(Some(TAB));
    c.connect_source(TAB, source.clone());
    c.on_source_message(TAB, &source, state_update(2));

    c.tab_removed(TAB);
    assert!(c.page(TAB).is_none());
    assert_eq!(c.active_tab(), None);
    assert_eq!(board.get(TAB), Some(Badge::neutral()));

    c.on_source_message(TAB, &source, state_update(4));
    c.source_disconnected(TAB, source.id());
    assert!(c.page(TAB).is_none(), "Retired port cannot recreate the tab");
}

#[test]
fn retired_ports_are_forgotten_after_their_disconnect() {
    let (mut c, _board) = coordinator();
    let (source, _source_rx) = source_port();
    let (client, _client_rx) = client_port();
    c.set_active_tab(Some(TAB));
    c.connect_source(TAB, source.clone());
    c.connect_client(client.clone());

    c.tab_removed(TAB);
    assert_eq!(c.retired_ports(), 2);

    c.source_disconnected(TAB, source.id());
    c.client_disconnected(client.id());

    assert_eq!(c.retired_ports(), 0);
    assert!(c.page(TAB).is_none(), "Late disconnects do not recreate the tab");
}

#[test]
fn tabs_are_independent() {
    let (mut c, board) = coordinator();
    let (a, _a_rx) = source_port();
    let (b, _b_rx) = source_port();
    c.connect_source(TabId(1), a.clone());
    c.connect_source(TabId(2), b.clone());
    c.on_source_message(TabId(1), &a, state_update(1));
    c.on_source_message(TabId(2), &b, state_update(3));

    c.source_disconnected(TabId(1), a.id());

    assert!(c.page(TabId(1)).unwrap().forms().is_empty());
    assert_eq!(c.page(TabId(2)).unwrap().forms().len(), 3);
    assert_eq!(board.snapshot().len(), 2);
    assert_eq!(board.get(TabId(2)).unwrap().text, "3");
}

// =========================================================================
// Relay-Source
// =========================================================================

struct Dead;

impl ContextLiveness for Dead {
    fn is_valid(&self) -> bool {
        false
    }
}

#[test]
fn page_messages_are_relayed_and_cached() {
    let mut relay = RelaySource::new(Duration::from_millis(1000));

    let out = relay.on_page_message(PageEnvelope::new(PageMessage::FormsUpdate {
        forms: forms(2),
        timestamp: 42,
    }));
    assert_eq!(
        out,
        Some(SourceMessage::StateUpdate {
            forms: forms(2),
            timestamp: 42
        })
    );
    assert_eq!(relay.latest_forms().len(), 2);

    let out = relay.on_page_message(PageEnvelope::new(PageMessage::BadgeUpdate { count: 2 }));
    assert_eq!(out, Some(SourceMessage::CountUpdate { count: 2 }));
}

#[test]
fn foreign_window_messages_are_ignored() {
    let mut relay = RelaySource::new(Duration::from_millis(1000));
    let foreign = PageEnvelope {
        source: "someone-else".into(),
        message: PageMessage::FormsUpdate {
            forms: forms(1),
            timestamp: 1,
        },
    };

    assert_eq!(relay.on_page_message(foreign), None);
    assert!(relay.latest_forms().is_empty());
}

#[test]
fn query_answers_from_latest_and_asks_page_to_rescan() {
    let mut relay = RelaySource::new(Duration::from_millis(1000));
    relay.on_page_message(PageEnvelope::new(PageMessage::FormsUpdate {
        forms: forms(1),
        timestamp: 1,
    }));

    let actions = relay.on_command(SourceCommand::QueryCurrentState);

    assert!(matches!(
        actions.to_coordinator,
        Some(SourceMessage::CurrentState { ref forms, .. }) if forms.len() == 1
    ));
    assert_eq!(actions.to_page, Some(PageEnvelope::new(PageMessage::RefreshRequest)));
}

#[test]
fn refresh_goes_to_page_only() {
    let mut relay = RelaySource::new(Duration::from_millis(1000));

    let actions = relay.on_command(SourceCommand::RefreshCommand);

    assert_eq!(actions.to_coordinator, None);
    assert_eq!(actions.to_page, Some(PageEnvelope::new(PageMessage::RefreshRequest)));
}

#[test]
fn reconnect_reannounces_latest_snapshot() {
    let mut relay = RelaySource::new(Duration::from_millis(1000));
    assert_eq!(relay.on_connected(), None, "Nothing to announce yet");

    relay.on_page_message(PageEnvelope::new(PageMessage::FormsUpdate {
        forms: forms(2),
        timestamp: 9,
    }));
    relay.on_disconnected(&ExtensionContext::new());

    assert_eq!(
        relay.on_connected(),
        Some(SourceMessage::StateUpdate {
            forms: forms(2),
            timestamp: 9
        })
    );
    assert_eq!(relay.link(), LinkState::Connected);
}

#[test]
fn disconnect_retries_while_context_is_valid() {
    let mut relay = RelaySource::new(Duration::from_millis(1000));
    let context = ExtensionContext::new();
    relay.on_connected();

    assert_eq!(
        relay.on_disconnected(&context),
        Reconnect::RetryAfter(Duration::from_millis(1000))
    );
    assert_eq!(relay.link(), LinkState::Connecting);

    context.invalidate();
    assert_eq!(relay.on_disconnected(&context), Reconnect::Stop);
    assert_eq!(relay.link(), LinkState::Stopped);
}

#[test]
fn stopped_relay_stays_stopped() {
    let mut relay = RelaySource::new(Duration::from_millis(1000));

    assert_eq!(relay.on_disconnected(&Dead), Reconnect::Stop);
    assert_eq!(relay.on_disconnected(&ExtensionContext::new()), Reconnect::Stop);
}

// =========================================================================
// Wire format
// =========================================================================

#[test]
fn window_envelope_wire_format() {
    let envelope = PageEnvelope::new(PageMessage::BadgeUpdate { count: 3 });
    let wire = serde_json::to_value(&envelope).unwrap();

    assert_eq!(
        wire,
        json!({ "source": "formik-inspector", "type": "badge-update", "count": 3 })
    );

    let back: PageEnvelope =
        serde_json::from_value(json!({ "source": "formik-inspector", "type": "refresh-request" }))
            .unwrap();
    assert_eq!(back.message, PageMessage::RefreshRequest);
}
