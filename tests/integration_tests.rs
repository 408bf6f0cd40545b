//! Integration tests for the tutor-match service
//!
//! These tests validate the entire system working together, including:
//! - Complete matchmaking and chat session workflows
//! - Public chat history and bounded buffering
//! - Presence broadcasts and disconnect cleanup
//! - Activity logging side effects

// Modules for organizing tests
mod fixtures;

use tokio::time::{sleep, Duration};
use tutor_match::types::{AuditKind, Grade, Role};
use tutor_match::ws::messages::{ClientEvent, ServerEvent};

use fixtures::{create_test_system, find_match, TestClient};

#[tokio::test]
async fn test_complete_match_and_chat_workflow() {
    let (hub, _store) = create_test_system().await;
    let mut alice = TestClient::connect(&hub).await;
    let mut bob = TestClient::connect(&hub).await;
    alice.drain();
    bob.drain();

    // Alice waits; nothing compatible is queued yet
    hub.handle_event(alice.id, find_match("alice", Grade::M5, "math", Role::Student))
        .await;
    assert!(alice.match_found().is_none());
    assert_eq!(hub.stats().await.waiting, 1);

    // Bob completes the pair
    hub.handle_event(bob.id, find_match("bob", Grade::M5, "math", Role::Tutor))
        .await;

    let alice_notice = alice.match_found().expect("alice should be notified");
    let bob_notice = bob.match_found().expect("bob should be notified");

    assert_eq!(alice_notice.match_id, bob_notice.match_id);
    assert_eq!(alice_notice.partner_name, "bob");
    assert_eq!(alice_notice.partner_role, Role::Tutor);
    assert_eq!(bob_notice.partner_name, "alice");
    assert_eq!(bob_notice.partner_role, Role::Student);

    let stats = hub.stats().await;
    assert_eq!(stats.waiting, 0);
    assert_eq!(stats.matches_made, 1);
    assert_eq!(stats.active_rooms, 1);

    // Both join the room; each join announces the joiner to the room
    let match_id = alice_notice.match_id;
    hub.handle_event(
        alice.id,
        ClientEvent::JoinChat {
            match_id: match_id.clone(),
        },
    )
    .await;
    hub.handle_event(
        bob.id,
        ClientEvent::JoinChat {
            match_id: match_id.clone(),
        },
    )
    .await;

    let announcements: Vec<_> = bob
        .drain()
        .into_iter()
        .filter(|event| matches!(event, ServerEvent::ChatConnected { .. }))
        .collect();
    assert_eq!(announcements.len(), 2);

    // A message from alice reaches both members
    alice.drain();
    hub.handle_event(
        alice.id,
        ClientEvent::ChatMessage {
            match_id: match_id.clone(),
            message: "hi bob".to_string(),
        },
    )
    .await;

    for client in [&mut alice, &mut bob] {
        let events = client.drain();
        assert!(events.iter().any(|event| matches!(
            event,
            ServerEvent::ChatMessage(msg) if msg.message == "hi bob" && msg.username == "alice"
        )));
    }

    // A rejoin by someone with prior messages replays the room history
    hub.handle_event(alice.id, ClientEvent::JoinChat { match_id }).await;
    let events = alice.drain();
    assert!(events.iter().any(|event| matches!(
        event,
        ServerEvent::ChatHistory(history) if history.len() == 1
    )));
}

#[tokio::test]
async fn test_pairing_prefers_longest_waiting_candidate() {
    let (hub, _store) = create_test_system().await;
    let mut first = TestClient::connect(&hub).await;
    let mut second = TestClient::connect(&hub).await;
    let mut tutor = TestClient::connect(&hub).await;

    hub.handle_event(first.id, find_match("first", Grade::M6, "physics", Role::Student))
        .await;
    hub.handle_event(second.id, find_match("second", Grade::M6, "physics", Role::Student))
        .await;
    hub.handle_event(tutor.id, find_match("tutor", Grade::M6, "physics", Role::Tutor))
        .await;

    assert!(first.match_found().is_some());
    assert!(second.match_found().is_none());
    assert!(tutor.match_found().is_some());
    assert_eq!(hub.stats().await.waiting, 1);
}

#[tokio::test]
async fn test_requeue_keeps_single_waiting_entry() {
    let (hub, _store) = create_test_system().await;
    let mut alice = TestClient::connect(&hub).await;
    let mut m4_tutor = TestClient::connect(&hub).await;
    let mut m5_tutor = TestClient::connect(&hub).await;

    // Alice changes her mind about the grade; only the newest entry stands
    hub.handle_event(alice.id, find_match("alice", Grade::M4, "math", Role::Student))
        .await;
    hub.handle_event(alice.id, find_match("alice", Grade::M5, "math", Role::Student))
        .await;
    assert_eq!(hub.stats().await.waiting, 1);

    // The abandoned m4 entry must not produce a match
    hub.handle_event(m4_tutor.id, find_match("m4t", Grade::M4, "math", Role::Tutor))
        .await;
    assert!(m4_tutor.match_found().is_none());

    hub.handle_event(m5_tutor.id, find_match("m5t", Grade::M5, "math", Role::Tutor))
        .await;
    assert!(m5_tutor.match_found().is_some());
    assert!(alice.match_found().is_some());
}

#[tokio::test]
async fn test_cancel_match_leaves_the_queue() {
    let (hub, _store) = create_test_system().await;
    let mut alice = TestClient::connect(&hub).await;
    let mut tutor = TestClient::connect(&hub).await;

    hub.handle_event(alice.id, find_match("alice", Grade::M4, "english", Role::Student))
        .await;
    hub.handle_event(alice.id, ClientEvent::CancelMatch).await;
    assert_eq!(hub.stats().await.waiting, 0);

    hub.handle_event(tutor.id, find_match("tutor", Grade::M4, "english", Role::Tutor))
        .await;
    assert!(tutor.match_found().is_none());
    assert!(alice.match_found().is_none());
}

#[tokio::test]
async fn test_public_feed_keeps_last_hundred_in_order() {
    let (hub, _store) = create_test_system().await;
    let mut alice = TestClient::connect(&hub).await;
    let mut observer = TestClient::connect(&hub).await;

    hub.handle_event(alice.id, find_match("alice", Grade::M5, "math", Role::Student))
        .await;
    for i in 0..101 {
        hub.handle_event(alice.id, ClientEvent::PublicMessage(format!("message-{}", i)))
            .await;
    }

    // Every post was broadcast live
    let live: Vec<_> = observer
        .drain()
        .into_iter()
        .filter(|event| matches!(event, ServerEvent::NewPublicMessage(_)))
        .collect();
    assert_eq!(live.len(), 101);

    // The snapshot is capped at 100, oldest surviving entry first
    hub.handle_event(observer.id, ClientEvent::JoinPublicChat).await;
    let events = observer.drain();
    let history = events
        .iter()
        .find_map(|event| match event {
            ServerEvent::PublicChatHistory(history) => Some(history),
            _ => None,
        })
        .expect("observer should receive the public history");

    assert_eq!(history.len(), 100);
    assert_eq!(history[0].message, "message-1");
    assert_eq!(history[99].message, "message-100");
    assert_eq!(history[0].username, "alice");
}

#[tokio::test]
async fn test_public_message_without_profile_is_anonymous() {
    let (hub, _store) = create_test_system().await;
    let mut alice = TestClient::connect(&hub).await;

    hub.handle_event(alice.id, ClientEvent::PublicMessage("hello".to_string()))
        .await;

    let events = alice.drain();
    assert!(events.iter().any(|event| matches!(
        event,
        ServerEvent::NewPublicMessage(msg) if msg.username == "Anonymous"
    )));
}

#[tokio::test]
async fn test_room_survives_partner_disconnect() {
    let (hub, _store) = create_test_system().await;
    let mut alice = TestClient::connect(&hub).await;
    let mut bob = TestClient::connect(&hub).await;

    hub.handle_event(alice.id, find_match("alice", Grade::M5, "math", Role::Student))
        .await;
    hub.handle_event(bob.id, find_match("bob", Grade::M5, "math", Role::Tutor))
        .await;
    let match_id = bob.match_found().expect("bob should be matched").match_id;

    hub.disconnect(alice.id).await;
    assert_eq!(hub.stats().await.active_rooms, 1);

    // Bob can still post into the surviving room and hears himself
    bob.drain();
    hub.handle_event(
        bob.id,
        ClientEvent::ChatMessage {
            match_id,
            message: "anyone there?".to_string(),
        },
    )
    .await;

    let events = bob.drain();
    assert!(events.iter().any(|event| matches!(
        event,
        ServerEvent::ChatMessage(msg) if msg.message == "anyone there?"
    )));
}

#[tokio::test]
async fn test_message_to_unknown_room_is_dropped() {
    let (hub, store) = create_test_system().await;
    let mut alice = TestClient::connect(&hub).await;
    alice.drain();

    hub.handle_event(
        alice.id,
        ClientEvent::ChatMessage {
            match_id: "1700000000000-deadbeef0".to_string(),
            message: "hello?".to_string(),
        },
    )
    .await;

    let events = alice.drain();
    assert!(!events
        .iter()
        .any(|event| matches!(event, ServerEvent::ChatMessage(_))));
    assert_eq!(hub.stats().await.messages_relayed, 0);

    // A dropped message leaves no chat record in the activity log
    sleep(Duration::from_millis(50)).await;
    assert_eq!(store.count_of(AuditKind::Chat), 0);
}

#[tokio::test]
async fn test_presence_broadcasts_on_connect_and_disconnect() {
    let (hub, _store) = create_test_system().await;
    let mut alice = TestClient::connect(&hub).await;
    let bob = TestClient::connect(&hub).await;

    let events = alice.drain();
    let online_sets: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::OnlineUsers(ids) => Some(ids.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(online_sets.len(), 2);
    assert_eq!(online_sets[1].len(), 2);

    hub.disconnect(bob.id).await;
    let events = alice.drain();
    assert!(events.iter().any(|event| matches!(
        event,
        ServerEvent::OnlineUsers(ids) if ids == &vec![alice.id]
    )));

    // An explicit request answers the caller only
    hub.handle_event(alice.id, ClientEvent::RequestOnlineUsers).await;
    let events = alice.drain();
    assert!(matches!(
        events.last(),
        Some(ServerEvent::OnlineUsers(ids)) if ids == &vec![alice.id]
    ));
}

#[tokio::test]
async fn test_activity_log_covers_the_session() {
    let (hub, store) = create_test_system().await;
    let alice = TestClient::connect(&hub).await;

    hub.handle_event(alice.id, find_match("alice", Grade::M5, "math", Role::Student))
        .await;
    hub.handle_event(alice.id, ClientEvent::PublicMessage("hello".to_string()))
        .await;
    hub.disconnect(alice.id).await;

    // The audit worker drains asynchronously
    sleep(Duration::from_millis(50)).await;

    assert_eq!(store.count_of(AuditKind::Login), 1);
    assert_eq!(store.count_of(AuditKind::Chat), 1);
    assert_eq!(store.count_of(AuditKind::Logout), 1);

    let records = store.records();
    let chat = records
        .iter()
        .find(|record| record.kind == AuditKind::Chat)
        .expect("chat record should exist");
    assert_eq!(chat.username.as_deref(), Some("alice"));
    assert_eq!(chat.details["message"], "hello");
}
