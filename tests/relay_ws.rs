mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tabletalk::rooms::{Message, MessageKind, ServerEvent};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: SocketAddr) -> Socket {
    let (socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    socket
}

async fn send(socket: &mut Socket, frame: Value) {
    socket.send(tungstenite::Message::text(frame.to_string())).await.unwrap();
}

async fn join(socket: &mut Socket, name: &str, room: &str, role: &str) {
    send(socket, json!({ "event": "join", "data": { "displayName": name, "roomId": room, "role": role } })).await;
}

async fn next_event(socket: &mut Socket) -> ServerEvent {
    loop {
        let frame = timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let tungstenite::Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn next_message(socket: &mut Socket) -> Message {
    match next_event(socket).await {
        ServerEvent::Message(msg) => msg,
        other => panic!("expected a message, got {other:?}"),
    }
}

async fn previous_messages(socket: &mut Socket) -> Vec<Message> {
    match next_event(socket).await {
        ServerEvent::PreviousMessages(history) => history,
        other => panic!("expected history, got {other:?}"),
    }
}

async fn assert_silent(socket: &mut Socket) {
    assert!(
        timeout(Duration::from_millis(200), socket.next()).await.is_err(),
        "expected no frame"
    );
}

#[tokio::test]
async fn master_and_player_share_a_table() {
    let (addr, state) = common::spawn(common::test_config(&[])).await;
    let mut gm = connect(addr).await;
    let mut rin = connect(addr).await;

    join(&mut gm, "GM", "table-1", "master").await;
    assert!(previous_messages(&mut gm).await.is_empty());
    let gm_joined = next_message(&mut gm).await;
    assert_eq!(gm_joined.content, "GM entered the room");
    assert_eq!(gm_joined.kind, MessageKind::System);

    join(&mut rin, "Rin", "table-1", "player").await;
    let replay = previous_messages(&mut rin).await;
    assert_eq!(replay, vec![gm_joined.clone()]);
    assert_eq!(next_message(&mut rin).await.content, "Rin entered the room");
    assert_eq!(next_message(&mut gm).await.content, "Rin entered the room");

    send(&mut rin, json!({ "event": "sendMessage", "data": { "content": "Hello" } })).await;
    for socket in [&mut gm, &mut rin] {
        let hello = next_message(socket).await;
        assert_eq!(hello.sender, "Rin");
        assert_eq!(hello.content, "Hello");
        assert_eq!(hello.kind, MessageKind::Chat);
    }

    rin.close(None).await.unwrap();
    let left = next_message(&mut gm).await;
    assert_eq!(left.content, "Rin left the room");
    assert_eq!(left.kind, MessageKind::System);

    let history: Vec<String> = state.relay.history("table-1").into_iter().map(|m| m.content).collect();
    assert_eq!(history, ["GM entered the room", "Rin entered the room", "Hello", "Rin left the room"]);
}

#[tokio::test]
async fn rolls_are_broadcast_formatted() {
    let (addr, _state) = common::spawn(common::test_config(&[])).await;
    let mut rin = connect(addr).await;
    join(&mut rin, "Rin", "table-1", "player").await;
    let _ = previous_messages(&mut rin).await;
    let _ = next_message(&mut rin).await;

    send(
        &mut rin,
        json!({ "event": "sendRoll", "data": { "dieSize": 20, "results": [5, 15], "modifier": 0, "total": 20 } }),
    )
    .await;
    let roll = next_message(&mut rin).await;
    assert_eq!(roll.kind, MessageKind::Roll);
    assert_eq!(roll.sender, "Rin");
    assert_eq!(roll.content, "2d20: 5, 15 = 20");

    send(&mut rin, json!({ "event": "rollDice", "data": { "dieSize": 1, "count": 2, "modifier": -1 } })).await;
    assert_eq!(next_message(&mut rin).await.content, "2d1: 1, 1 - 1 = 1");
}

#[tokio::test]
async fn unjoined_and_unreadable_frames_are_ignored() {
    let (addr, state) = common::spawn(common::test_config(&[])).await;
    let mut socket = connect(addr).await;

    send(&mut socket, json!({ "event": "sendMessage", "data": { "content": "too early" } })).await;
    send(&mut socket, json!({ "event": "sendRoll", "data": { "dieSize": 6, "results": [3], "total": 3 } })).await;
    socket.send(tungstenite::Message::text("definitely not json")).await.unwrap();
    send(&mut socket, json!({ "event": "teleport", "data": {} })).await;

    join(&mut socket, "Kai", "table-2", "player").await;
    assert!(previous_messages(&mut socket).await.is_empty());
    assert_eq!(next_message(&mut socket).await.content, "Kai entered the room");
    assert_silent(&mut socket).await;
    assert_eq!(state.relay.history("table-2").len(), 1);
}

#[tokio::test]
async fn closing_before_join_leaves_no_trace() {
    let (addr, state) = common::spawn(common::test_config(&[])).await;
    let mut gm = connect(addr).await;
    join(&mut gm, "GM", "table-1", "master").await;
    let _ = previous_messages(&mut gm).await;
    let _ = next_message(&mut gm).await;

    let mut ghost = connect(addr).await;
    ghost.close(None).await.unwrap();

    assert_silent(&mut gm).await;
    assert_eq!(state.relay.history("table-1").len(), 1);
}

#[tokio::test]
async fn rooms_do_not_leak_into_each_other() {
    let (addr, _state) = common::spawn(common::test_config(&[])).await;
    let mut one = connect(addr).await;
    let mut two = connect(addr).await;
    join(&mut one, "GM", "table-1", "master").await;
    join(&mut two, "GM", "Table-1", "master").await;
    for socket in [&mut one, &mut two] {
        assert!(previous_messages(socket).await.is_empty());
        let _ = next_message(socket).await;
    }

    send(&mut one, json!({ "event": "sendMessage", "data": { "content": "lowercase only" } })).await;

    assert_eq!(next_message(&mut one).await.content, "lowercase only");
    assert_silent(&mut two).await;
}
