//! Connection registry and transport plumbing.
//!
//! Each session runs one task: inbound frames decode to intents for the
//! tick loop's queue, outbound frames arrive pre-encoded on a broadcast
//! channel and are forwarded verbatim. No game logic lives here.

pub mod engine;
pub mod session;

pub use engine::{Engine, run_engine_loop};

use crate::command::{Intent, SessionId};
use crate::config::Config;
use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Duration, Instant, sleep_until, timeout};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// A pre-encoded outbound text frame; every session forwards the same
/// bytes unchanged.
pub type Frame = tokio_tungstenite::tungstenite::Utf8Bytes;

/// A frame addressed to a single session (the `init` join reply).
#[derive(Debug, Clone)]
pub struct TargetedFrame {
    pub session: SessionId,
    pub frame: Frame,
}

/// Run the game server until a shutdown signal arrives.
///
/// Failing to bind the listen port is the one fatal error; everything
/// after that recovers locally.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on ws://{}", addr);

    // All world mutation is funneled through this queue into the one
    // task that owns the engine.
    let (intent_tx, intent_rx) = mpsc::channel::<Intent>(1024);
    let (frame_tx, _) = broadcast::channel::<Frame>(config.server.broadcast_buffer);
    let (targeted_tx, _) = broadcast::channel::<TargetedFrame>(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let engine = Engine::new(config.clone(), frame_tx.clone(), targeted_tx.clone());
    let engine_task = tokio::spawn(run_engine_loop(engine, intent_rx, shutdown_rx));

    let next_session = Arc::new(AtomicU32::new(1));
    let join_timeout = Duration::from_secs(config.server.join_timeout_secs);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            accepted = listener.accept() => {
                let (stream, addr) = accepted?;
                let session = next_session.fetch_add(1, Ordering::Relaxed);
                let intent_tx = intent_tx.clone();
                let frame_rx = frame_tx.subscribe();
                let targeted_rx = targeted_tx.subscribe();
                tokio::spawn(async move {
                    let result = handle_session(
                        stream, addr, session, intent_tx, frame_rx, targeted_rx, join_timeout,
                    )
                    .await;
                    if let Err(e) = result {
                        debug!("Session {} ({}) ended with error: {}", session, addr, e);
                    }
                });
            }
        }
    }

    // Stop tick scheduling, bound the remaining drain, then let sessions
    // observe the closed channels and finish.
    let _ = shutdown_tx.send(true);
    let grace = Duration::from_millis(config.server.shutdown_grace_ms);
    if timeout(grace, engine_task).await.is_err() {
        warn!("Tick loop did not stop within {:?}", grace);
    }
    Ok(())
}

/// Handle a single session: `Connecting -> Joined -> Closing -> Closed`.
async fn handle_session(
    stream: TcpStream,
    addr: SocketAddr,
    session: SessionId,
    intent_tx: mpsc::Sender<Intent>,
    mut frame_rx: broadcast::Receiver<Frame>,
    mut targeted_rx: broadcast::Receiver<TargetedFrame>,
    join_timeout: Duration,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("Session {} connected from {}", session, addr);
    let (mut write, mut read) = ws_stream.split();

    intent_tx
        .send(Intent::Connect { session })
        .await
        .map_err(|_| anyhow::anyhow!("engine stopped"))?;

    // Joined flips when the engine's `init` reply comes back; until then
    // the join deadline is armed.
    let mut joined = false;
    let join_deadline = Instant::now() + join_timeout;

    loop {
        tokio::select! {
            _ = sleep_until(join_deadline), if !joined => {
                info!("Session {} closed: no accepted join within {:?}", session, join_timeout);
                break;
            }
            inbound = read.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => match protocol::decode_client(&text) {
                        Ok(command) => {
                            // Per-session order is preserved by the queue. A
                            // full queue sheds the command instead of
                            // blocking the read loop.
                            match intent_tx.try_send(Intent::from_message(session, command)) {
                                Ok(()) => {}
                                Err(mpsc::error::TrySendError::Full(_)) => {
                                    warn!("Session {}: command queue full, dropping command", session);
                                }
                                Err(mpsc::error::TrySendError::Closed(_)) => break,
                            }
                        }
                        Err(e) => debug!("Session {}: ignoring bad frame: {}", session, e),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // binary/ping/pong are not part of the protocol
                    Some(Err(e)) => {
                        debug!("Session {}: websocket error: {}", session, e);
                        break;
                    }
                }
            }
            frame = frame_rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if write.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Session {} fell {} frames behind, closing", session, n);
                        break;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            targeted = targeted_rx.recv() => {
                match targeted {
                    Ok(t) if t.session == session => {
                        // The only targeted frame in this protocol is the
                        // join reply, so its arrival marks the session joined.
                        joined = true;
                        if write.send(Message::Text(t.frame)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Session {} fell {} targeted frames behind, closing", session, n);
                        break;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    // World cleanup is deferred to the next tick boundary.
    let _ = intent_tx.send(Intent::Disconnect { session }).await;
    let _ = write.close().await;
    info!("Session {} disconnected", session);
    Ok(())
}
