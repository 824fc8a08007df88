// WebSocket handlers: one task per connection multiplexing the client's
// commands with its room feed.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use castlefall_shared::{ClientMsg, ErrorCode, ServerMsg};
use futures::StreamExt;
use owo_colors::OwoColorize;

use crate::error::GameError;
use crate::game::RoomEvent;
use crate::server::event_log::EventStream;
use crate::server::room::Room;
use crate::server::session::{AckCursor, ConnectionId, SessionKey};
use crate::server::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// A connection that has joined a room.
struct Binding {
    key: SessionKey,
    room: Arc<Room>,
    feed: EventStream,
    /// Highest sequence forwarded on this connection.
    last_sent: u64,
    /// Sequence of the join that opened the seat; older kicks are history.
    joined_seq: u64,
    acked: AckCursor,
}

async fn next_event(binding: &mut Option<Binding>) -> Option<Arc<RoomEvent>> {
    match binding {
        Some(b) => b.feed.next().await,
        None => futures::future::pending().await,
    }
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let conn = state.sessions.next_connection_id();
    let hello = format!("{} {}", "[CONNECT]".bold().green(), conn);
    tracing::info!(%hello);

    let mut binding: Option<Binding> = None;

    loop {
        tokio::select! {
            ev = next_event(&mut binding) => {
                match ev {
                    Some(ev) => forward_event(&mut socket, &mut binding, &ev).await,
                    None => {
                        // Feed ended: the room was removed under us.
                        send_ws(&mut socket, &ServerMsg::RoomClosed).await;
                        binding = None;
                    }
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(txt))) => {
                        let reply = match serde_json::from_str::<ClientMsg>(&txt) {
                            Ok(cm) => {
                                tracing::debug!(conn, ws_received_client_msg = ?cm);
                                handle_command(&state, conn, &mut binding, cm)
                                    .await
                                    .unwrap_or_else(|e| Some(e.to_server_msg()))
                            }
                            Err(e) => {
                                tracing::warn!(conn, error = %e, "failed to parse incoming ClientMsg JSON");
                                tracing::debug!(raw_in = %txt);
                                Some(ServerMsg::Error {
                                    code: ErrorCode::Malformed,
                                    message: format!("malformed ClientMsg JSON: {e}"),
                                })
                            }
                        };
                        if let Some(reply) = reply {
                            send_ws(&mut socket, &reply).await;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    match binding {
        Some(b) => state.sessions.detach(&b.key, conn).await,
        None => tracing::info!(conn, "client disconnected"),
    }
}

async fn forward_event(socket: &mut WebSocket, binding: &mut Option<Binding>, ev: &RoomEvent) {
    let Some(b) = binding.as_mut() else {
        return;
    };
    if ev.seq <= b.last_sent {
        return;
    }
    b.last_sent = ev.seq;
    let env = ev.view_for(Some(b.key.name.as_str()));
    send_ws(socket, &ServerMsg::Event(env)).await;

    if ev.seq > b.joined_seq && ev.kicks(&b.key.name) {
        tracing::info!(room = %b.key.room, player = %b.key.name, "kicked, unbinding connection");
        send_ws(socket, &ServerMsg::Kicked).await;
        *binding = None;
    }
}

fn bound(binding: &Option<Binding>) -> Result<&Binding, GameError> {
    binding.as_ref().ok_or(GameError::NotJoined)
}

fn accepted(ev: Arc<RoomEvent>) -> Option<ServerMsg> {
    Some(ServerMsg::Accepted { seq: Some(ev.seq) })
}

/// Run one client command. `Ok(None)` means nothing is sent back.
async fn handle_command(
    state: &AppState,
    conn: ConnectionId,
    binding: &mut Option<Binding>,
    cm: ClientMsg,
) -> Result<Option<ServerMsg>, GameError> {
    match cm {
        ClientMsg::Join { room, name, from } => {
            if let Some(b) = binding.as_ref() {
                return Err(GameError::AlreadyJoined(b.key.room.clone()));
            }
            let att = state.sessions.attach(&room, &name, conn, from).await?;
            let snapshot = att.room.snapshot(Some(att.key.name.as_str())).await;
            let welcome = ServerMsg::Welcome {
                room: att.key.room.clone(),
                you: att.key.name.clone(),
                resumed: att.resumed,
                snapshot,
            };
            *binding = Some(Binding {
                feed: att.room.subscribe(att.replay_from),
                last_sent: att.replay_from.saturating_sub(1),
                joined_seq: att.joined_seq,
                acked: att.acked,
                key: att.key,
                room: att.room,
            });
            Ok(Some(welcome))
        }
        ClientMsg::StartRound { words } => {
            let b = bound(binding)?;
            b.room.start_round(words).await.map(accepted)
        }
        ClientMsg::StartDeclaration => {
            let b = bound(binding)?;
            b.room.start_declaration().await.map(accepted)
        }
        ClientMsg::DeclareWin { name } => {
            let b = bound(binding)?;
            let claimant = name.unwrap_or_else(|| b.key.name.clone());
            b.room.declare_win(&claimant).await.map(accepted)
        }
        ClientMsg::NewGame => {
            let b = bound(binding)?;
            b.room.new_game().await.map(accepted)
        }
        ClientMsg::Kick { name } => {
            let b = bound(binding)?;
            state.sessions.kick(&b.key, &name).await.map(accepted)
        }
        ClientMsg::Leave => {
            let key = bound(binding)?.key.clone();
            let ev = state.sessions.release(&key, conn).await?;
            *binding = None;
            Ok(accepted(ev))
        }
        ClientMsg::Ack { seq } => {
            bound(binding)?.acked.ack(seq);
            Ok(None)
        }
        ClientMsg::Ping => Ok(Some(ServerMsg::Pong)),
    }
}

async fn send_ws(socket: &mut WebSocket, msg: &ServerMsg) {
    match serde_json::to_string(msg) {
        Ok(txt) => {
            let _ = socket.send(Message::Text(txt)).await;
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize ServerMsg for websocket send");
        }
    }
}
