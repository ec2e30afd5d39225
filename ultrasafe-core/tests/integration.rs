//! Integration tests: the pull protocol over a real WebSocket on
//! localhost: keepalives, frame delivery, faults, clean closes,
//! reconnects and teardown.

use std::io::Cursor;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

use ultrasafe_core::{ChannelState, PULL_TOKEN, PullChannel, PullConfig, ViewerStats, WsConnector};

// ── Helpers ──────────────────────────────────────────────────────

const WAIT: Duration = Duration::from_secs(5);

/// Bind a listener on an OS-assigned port and return the mask URL.
async fn ephemeral_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, format!("ws://{addr}/ws/mask"))
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .expect("timeout waiting for client")
        .unwrap();
    accept_async(stream).await.unwrap()
}

/// Next data message from the client, skipping ping/pong.
async fn next_data(ws: &mut WebSocketStream<TcpStream>) -> Message {
    loop {
        let msg = ws.next().await.expect("client went away").unwrap();
        if !matches!(msg, Message::Ping(_) | Message::Pong(_)) {
            return msg;
        }
    }
}

/// Wait for the client's next pull token.
async fn expect_pull(ws: &mut WebSocketStream<TcpStream>) {
    let msg = tokio::time::timeout(WAIT, next_data(ws))
        .await
        .expect("timeout waiting for pull");
    assert_eq!(msg.into_text().unwrap(), PULL_TOKEN);
}

fn gray_png(w: u32, h: u32, level: u8) -> Message {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(GrayImage::from_pixel(w, h, Luma([level])))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    Message::Binary(buf.into_inner())
}

fn rgba_png(w: u32, h: u32, px: [u8; 4]) -> Message {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba(px)))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    Message::Binary(buf.into_inner())
}

fn fast_config() -> PullConfig {
    PullConfig {
        reconnect_delay: Duration::from_millis(50),
        ..PullConfig::default()
    }
}

async fn wait_stats(
    rx: &mut tokio::sync::watch::Receiver<ViewerStats>,
    f: impl FnMut(&ViewerStats) -> bool,
) -> ViewerStats {
    tokio::time::timeout(WAIT, rx.wait_for(f))
        .await
        .expect("timeout waiting for stats")
        .unwrap()
        .clone()
}

// ── Pull cycle ───────────────────────────────────────────────────

#[tokio::test]
async fn test_pull_cycle_disconnect_and_reconnect() {
    let (listener, url) = ephemeral_listener().await;
    let mut channel = PullChannel::new(WsConnector::new(url), fast_config());
    let mut stats = channel.stats_receiver();
    let frames = channel.frame_receiver();
    let shutdown = channel.shutdown_handle();
    let client = tokio::spawn(async move { channel.run().await });

    // First connection: keepalive, two frames, then an abrupt drop.
    let mut ws = accept(&listener).await;
    expect_pull(&mut ws).await;
    ws.send(Message::text("ping")).await.unwrap();
    expect_pull(&mut ws).await;
    ws.send(rgba_png(100, 100, [255, 0, 0, 255])).await.unwrap();
    expect_pull(&mut ws).await;
    ws.send(rgba_png(100, 100, [0, 0, 0, 0])).await.unwrap();
    expect_pull(&mut ws).await;

    let s = wait_stats(&mut stats, |s| s.pulls_sent == 4).await;
    assert_eq!(s.frames_rendered, 2);
    assert_eq!(s.keepalives, 1);
    assert_eq!(s.surface_resizes, 1);
    assert_eq!((s.width, s.height), (100, 100));
    assert!(frames.borrow().pixels().all(|p| p[3] == 0));

    drop(ws);
    let s = wait_stats(&mut stats, |s| s.reconnects_scheduled == 1).await;
    assert_eq!(s.state, ChannelState::Faulted);

    // Second connection: larger frame forces a resize.
    let mut ws = accept(&listener).await;
    expect_pull(&mut ws).await;
    ws.send(gray_png(200, 150, 255)).await.unwrap();
    expect_pull(&mut ws).await;

    let s = wait_stats(&mut stats, |s| s.frames_rendered == 3).await;
    assert!(s.state.is_open());
    assert_eq!(s.surface_resizes, 2);
    assert_eq!(s.reconnects_scheduled, 1);
    assert_eq!(frames.borrow().dimensions(), (200, 150));
    let px = *frames.borrow().get_pixel(10, 10);
    assert_eq!(&px.0[..3], &[255, 0, 0]);
    assert!(px[3] > 0);

    shutdown.teardown();
    client.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_malformed_frame_keeps_pulling() {
    let (listener, url) = ephemeral_listener().await;
    let mut channel = PullChannel::new(WsConnector::new(url), fast_config());
    let mut stats = channel.stats_receiver();
    let shutdown = channel.shutdown_handle();
    let client = tokio::spawn(async move { channel.run().await });

    let mut ws = accept(&listener).await;
    expect_pull(&mut ws).await;
    ws.send(Message::Binary(b"not a png".to_vec())).await.unwrap();
    expect_pull(&mut ws).await;
    ws.send(gray_png(8, 8, 255)).await.unwrap();
    expect_pull(&mut ws).await;

    let s = wait_stats(&mut stats, |s| s.pulls_sent == 3).await;
    assert_eq!(s.frames_delivered, 2);
    assert_eq!(s.frames_dropped, 1);
    assert_eq!(s.frames_rendered, 1);
    assert!(s.state.is_open());

    shutdown.teardown();
    client.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_ping_neither_consumes_nor_grants_credit() {
    let (listener, url) = ephemeral_listener().await;
    let mut channel = PullChannel::new(WsConnector::new(url), fast_config());
    let mut stats = channel.stats_receiver();
    let shutdown = channel.shutdown_handle();
    let client = tokio::spawn(async move { channel.run().await });

    let mut ws = accept(&listener).await;
    expect_pull(&mut ws).await;

    ws.send(Message::Ping(b"hb".to_vec())).await.unwrap();
    let early = tokio::time::timeout(Duration::from_millis(300), next_data(&mut ws)).await;
    assert!(early.is_err(), "ping must not earn a pull");

    // The outstanding pull is still answered by a real reply.
    ws.send(gray_png(8, 8, 255)).await.unwrap();
    expect_pull(&mut ws).await;

    let s = wait_stats(&mut stats, |s| s.pulls_sent == 2).await;
    assert_eq!(s.frames_rendered, 1);
    assert_eq!(s.keepalives, 0);
    assert_eq!(s.reconnects_scheduled, 0);

    shutdown.teardown();
    client.await.unwrap().unwrap();
}

// ── Close / fault handling ───────────────────────────────────────

#[tokio::test]
async fn test_clean_server_close() {
    let (listener, url) = ephemeral_listener().await;
    let mut channel = PullChannel::new(WsConnector::new(url), fast_config());
    let mut stats = channel.stats_receiver();
    let shutdown = channel.shutdown_handle();
    let client = tokio::spawn(async move { channel.run().await });

    let mut ws = accept(&listener).await;
    expect_pull(&mut ws).await;
    ws.close(None).await.unwrap();

    let s = wait_stats(&mut stats, |s| s.reconnects_scheduled == 1).await;
    assert_eq!(s.state, ChannelState::Closed);

    // The client comes back on its own.
    let mut ws = accept(&listener).await;
    expect_pull(&mut ws).await;

    shutdown.teardown();
    client.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_refused_connection_retries_indefinitely() {
    let (listener, url) = ephemeral_listener().await;
    drop(listener);

    let mut channel = PullChannel::new(WsConnector::new(url), fast_config());
    let mut stats = channel.stats_receiver();
    let shutdown = channel.shutdown_handle();
    let client = tokio::spawn(async move { channel.run().await });

    let s = wait_stats(&mut stats, |s| s.reconnects_scheduled >= 3).await;
    assert_eq!(s.pulls_sent, 0);

    shutdown.teardown();
    client.await.unwrap().unwrap();
    assert_eq!(stats.borrow().state, ChannelState::Closed);
}

#[tokio::test]
async fn test_teardown_closes_socket() {
    let (listener, url) = ephemeral_listener().await;
    let mut channel = PullChannel::new(WsConnector::new(url), fast_config());
    let shutdown = channel.shutdown_handle();
    let client = tokio::spawn(async move { channel.run().await });

    let mut ws = accept(&listener).await;
    expect_pull(&mut ws).await;

    shutdown.teardown();
    client.await.unwrap().unwrap();

    let next = tokio::time::timeout(WAIT, ws.next())
        .await
        .expect("timeout waiting for close");
    assert!(matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))));

    // No reconnect after teardown.
    let again = tokio::time::timeout(Duration::from_millis(300), listener.accept()).await;
    assert!(again.is_err());
}
