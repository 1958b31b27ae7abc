//! Tests for the live push channel server

use std::time::Duration;

use fleet_protocol::{Location, PositionWriter, latest_position};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::*;
use crate::broadcaster::Fanout;
use crate::codec::MAX_COMMAND_LENGTH;
use crate::listener::ListenerSet;

struct TestServer {
    address: SocketAddr,
    broadcaster: Arc<LiveBroadcaster>,
    writer: PositionWriter<Location>,
    cancel: CancellationToken,
}

async fn start(max_listeners: usize) -> TestServer {
    let (writer, reader) = latest_position();
    let broadcaster = Arc::new(LiveBroadcaster::with_listeners(
        reader,
        ListenerSet::new(max_listeners, 16),
    ));
    let server = LiveServer::bind("127.0.0.1:0", Arc::clone(&broadcaster))
        .await
        .unwrap();
    let address = server.local_addr().unwrap();
    let cancel = CancellationToken::new();
    tokio::spawn(server.run(cancel.clone()));

    TestServer {
        address,
        broadcaster,
        writer,
        cancel,
    }
}

async fn wait_for_listeners(broadcaster: &LiveBroadcaster, count: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while broadcaster.listener_count() != count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("listener count should settle");
}

async fn read_line(lines: &mut tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>) -> String {
    tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("line should arrive")
        .unwrap()
        .expect("connection should stay open")
}

#[tokio::test]
async fn test_pushed_locations_arrive_as_lines() {
    let server = start(10).await;
    let stream = TcpStream::connect(server.address).await.unwrap();
    let (reader, _writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    wait_for_listeners(&server.broadcaster, 1).await;

    server
        .broadcaster
        .push(&Location::new("12.9784,77.6408"))
        .unwrap();
    server
        .broadcaster
        .push(&Location::new("12.9308,77.5839"))
        .unwrap();

    assert_eq!(read_line(&mut lines).await, "12.9784,77.6408");
    assert_eq!(read_line(&mut lines).await, "12.9308,77.5839");

    server.cancel.cancel();
}

#[tokio::test]
async fn test_pull_command_answers_on_same_connection() {
    let server = start(10).await;

    let (reader, mut writer) = TcpStream::connect(server.address)
        .await
        .unwrap()
        .into_split();
    let mut lines = BufReader::new(reader).lines();

    let (other_reader, _other_writer) = TcpStream::connect(server.address)
        .await
        .unwrap()
        .into_split();
    let mut other_lines = BufReader::new(other_reader).lines();

    wait_for_listeners(&server.broadcaster, 2).await;

    writer.write_all(b"PULL\n").await.unwrap();
    assert_eq!(
        read_line(&mut lines).await,
        r#"{"error":"No location data available yet"}"#
    );

    server.writer.set(Location::new("1,2"));
    writer.write_all(b"pull\n").await.unwrap();
    assert_eq!(read_line(&mut lines).await, r#"{"location":"1,2"}"#);

    // The other connection only ever sees pushes
    server
        .broadcaster
        .push(&Location::new("3,4"))
        .unwrap();
    assert_eq!(read_line(&mut other_lines).await, "3,4");

    server.cancel.cancel();
}

#[tokio::test]
async fn test_disconnect_deregisters_listener() {
    let server = start(10).await;
    let stream = TcpStream::connect(server.address).await.unwrap();
    wait_for_listeners(&server.broadcaster, 1).await;

    drop(stream);
    wait_for_listeners(&server.broadcaster, 0).await;

    server.cancel.cancel();
}

#[tokio::test]
async fn test_connection_over_cap_is_closed() {
    let server = start(1).await;
    let _first = TcpStream::connect(server.address).await.unwrap();
    wait_for_listeners(&server.broadcaster, 1).await;

    let second = TcpStream::connect(server.address).await.unwrap();
    let mut lines = BufReader::new(second).lines();

    let next = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("server should close the connection");
    assert!(matches!(next, Ok(None) | Err(_)));
    assert_eq!(server.broadcaster.listener_count(), 1);

    server.cancel.cancel();
}

#[tokio::test]
async fn test_bind_error() {
    let (_, reader) = latest_position();
    let broadcaster = Arc::new(LiveBroadcaster::with_listeners(reader, ListenerSet::default()));

    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = taken.local_addr().unwrap().to_string();

    let result = LiveServer::bind(&address, broadcaster).await;
    assert!(matches!(result, Err(TapError::Bind { .. })));
}

#[tokio::test]
async fn test_malformed_line_keeps_listener_subscribed() {
    let server = start(10).await;
    let (reader, mut writer) = TcpStream::connect(server.address)
        .await
        .unwrap()
        .into_split();
    let mut lines = BufReader::new(reader).lines();
    wait_for_listeners(&server.broadcaster, 1).await;

    writer.write_all(&[0xff, 0xfe, b'\n']).await.unwrap();
    assert_eq!(
        read_line(&mut lines).await,
        r#"{"error":"Failed to process location update"}"#
    );
    assert_eq!(server.broadcaster.listener_count(), 1);

    server
        .broadcaster
        .push(&Location::new("1,2"))
        .unwrap();
    assert_eq!(read_line(&mut lines).await, "1,2");

    server.cancel.cancel();
}

#[tokio::test]
async fn test_overlong_line_is_rejected_without_buffering() {
    let server = start(10).await;
    let (reader, mut writer) = TcpStream::connect(server.address)
        .await
        .unwrap()
        .into_split();
    let mut lines = BufReader::new(reader).lines();
    wait_for_listeners(&server.broadcaster, 1).await;

    // Well past the limit, with no terminator
    let flood = vec![b'a'; MAX_COMMAND_LENGTH * 64];
    writer.write_all(&flood).await.unwrap();
    assert_eq!(
        read_line(&mut lines).await,
        r#"{"error":"Failed to process location update"}"#
    );
    assert_eq!(server.broadcaster.listener_count(), 1);

    // The rest of the long line is dropped; the next line is a command again
    writer.write_all(b"aaaa\nPULL\n").await.unwrap();
    assert_eq!(
        read_line(&mut lines).await,
        r#"{"error":"No location data available yet"}"#
    );

    server
        .broadcaster
        .push(&Location::new("3,4"))
        .unwrap();
    assert_eq!(read_line(&mut lines).await, "3,4");

    server.cancel.cancel();
}
