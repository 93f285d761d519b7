//! End-to-end relay scenarios over the simulated chat surface.

use tokio::sync::mpsc;

use chat_relay::relay::CycleOutcome;
use chat_relay::{ChatRelay, Direction, EventKind, RelayConfig, RelayError, RelayEvent, SimSurface};

fn relay_over(surface: SimSurface) -> (ChatRelay<SimSurface>, mpsc::UnboundedSender<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChatRelay::new(surface, RelayConfig::default(), rx), tx)
}

fn continue_events(outcome: CycleOutcome) -> Vec<RelayEvent> {
    match outcome {
        CycleOutcome::Continue(events) => events,
        CycleOutcome::Shutdown => panic!("unexpected shutdown"),
    }
}

#[tokio::test]
async fn baseline_then_new_then_edit() {
    let surface = SimSurface::new();
    let m1 = surface.push_incoming("hi");

    let (mut relay, _tx) = relay_over(surface.clone());

    // Startup: m1 registered silently, nothing replayed.
    let registered = relay.baseline().await.unwrap();
    assert_eq!(registered, 1);

    // A second message arrives.
    surface.push_incoming("there");
    let events = continue_events(relay.tick().await);
    let lines: Vec<String> = events.iter().map(|e| e.to_string()).collect();
    assert_eq!(lines, vec!["[in ] there"]);

    // m1 is edited in place.
    surface.edit_message(&m1, "hi!");
    let events = continue_events(relay.tick().await);
    let lines: Vec<String> = events.iter().map(|e| e.to_string()).collect();
    assert_eq!(lines, vec!["[in ] [edit] hi!"]);

    // Quiet once everything has been seen.
    assert!(continue_events(relay.tick().await).is_empty());
}

#[tokio::test]
async fn startup_without_input_box_is_fatal() {
    let surface = SimSurface::new();
    surface.push_incoming("hi");
    surface.set_input_available(false);

    let (mut relay, _tx) = relay_over(surface);
    assert!(matches!(
        relay.baseline().await,
        Err(RelayError::InputNotFound)
    ));
}

#[tokio::test]
async fn startup_without_messages_is_fatal() {
    let (mut relay, _tx) = relay_over(SimSurface::new());
    assert!(matches!(relay.baseline().await, Err(RelayError::NoMessages)));
}

#[tokio::test]
async fn echo_conversation_round_trip() {
    let surface = SimSurface::echoing();
    surface.push_incoming("welcome");

    let (mut relay, tx) = relay_over(surface.clone());
    relay.baseline().await.unwrap();

    tx.send("hello?".to_string()).unwrap();
    let events = continue_events(relay.tick().await);

    // The sent line shows on the right, the echo on the left.
    let lines: Vec<String> = events.iter().map(|e| e.to_string()).collect();
    assert_eq!(lines, vec!["[you] hello?", "[in ] echo: hello?"]);
    assert!(events.iter().all(|e| e.kind == EventKind::New));
}

#[tokio::test]
async fn direction_is_informational_only() {
    let surface = SimSurface::new();
    surface.push_incoming("seed");

    let (mut relay, _tx) = relay_over(surface.clone());
    relay.baseline().await.unwrap();

    // Same logical message on both sides: two distinct identities, two
    // events, direction differing but detection unaffected.
    surface.push_incoming("same words");
    surface.push_outgoing("same words");
    let events = continue_events(relay.tick().await);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].direction, Direction::Incoming);
    assert_eq!(events[1].direction, Direction::Outgoing);
}

#[tokio::test]
async fn old_messages_beyond_tail_window_are_ignored() {
    let surface = SimSurface::new();
    let tail_window = RelayConfig::default().detection.tail_window;
    for n in 0..tail_window + 5 {
        surface.push_incoming(&format!("history {n}"));
    }

    let (mut relay, _tx) = relay_over(surface.clone());
    let registered = relay.baseline().await.unwrap();
    assert_eq!(registered, tail_window);

    // Pre-baseline history outside the window never replays: the window
    // only ever covers the tail, and the tail is already registered.
    assert!(continue_events(relay.tick().await).is_empty());
}

#[tokio::test]
async fn exit_sentinel_stops_the_session() {
    let surface = SimSurface::new();
    surface.push_incoming("seed");

    let (mut relay, tx) = relay_over(surface.clone());
    relay.baseline().await.unwrap();

    tx.send("last words".to_string()).unwrap();
    tx.send("/exit".to_string()).unwrap();

    assert!(matches!(relay.tick().await, CycleOutcome::Shutdown));
    assert_eq!(surface.submitted(), vec!["last words"]);
}
