use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tokio_tungstenite::tungstenite::Message;

use castlefall_shared::{ClientMsg, ServerMsg};

use super::commands::{parse_command, Input};
use super::transport::build_ws_url;
use super::utils::MessagePrinter;

fn announce_connection(json: bool, message: &str) {
    if json {
        eprintln!("{}", message);
    } else {
        println!("{}", message);
    }
}

/// Join `room` as `name` and play interactively until `quit`, a kick, or the
/// server going away. Every received event is acknowledged.
pub async fn play_ws(
    server: &str,
    room: &str,
    name: &str,
    from: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let ws_url = build_ws_url(server)?;
    let (ws_stream, _resp) = tokio_tungstenite::connect_async(ws_url.as_str())
        .await
        .with_context(|| format!("connecting to {}", ws_url))?;
    let (mut write, mut read) = ws_stream.split();

    let join = ClientMsg::Join {
        room: room.to_string(),
        name: name.to_string(),
        from,
    };
    write.send(Message::Text(serde_json::to_string(&join)?)).await?;
    announce_connection(json, &format!("Connected to WebSocket {}", ws_url));

    let mut stdin = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let mut stdin_open = true;
    let mut leaving = false;
    let mut printer = MessagePrinter::new(json);

    loop {
        tokio::select! {
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(txt))) => {
                        let sm = match serde_json::from_str::<ServerMsg>(&txt) {
                            Ok(sm) => sm,
                            Err(e) => {
                                eprintln!("Unparseable server message: {}", e);
                                continue;
                            }
                        };
                        printer.handle(&sm);
                        match sm {
                            ServerMsg::Event(env) => {
                                let ack = serde_json::to_string(&ClientMsg::Ack { seq: env.seq })?;
                                write.send(Message::Text(ack)).await?;
                            }
                            ServerMsg::Kicked | ServerMsg::RoomClosed => break,
                            ServerMsg::Accepted { .. } | ServerMsg::Error { .. } if leaving => break,
                            _ => {}
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_other)) => { /* ignore non-text frames */ }
                    Some(Err(e)) => {
                        eprintln!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            line = stdin.next(), if stdin_open => {
                match line {
                    Some(Ok(line)) => match parse_command(&line) {
                        Ok(Some(Input::Send(cm))) => {
                            if cm == ClientMsg::Leave {
                                // Stop reading input and close once the server replies.
                                leaving = true;
                                stdin_open = false;
                            }
                            write.send(Message::Text(serde_json::to_string(&cm)?)).await?;
                        }
                        Ok(Some(Input::Quit)) => break,
                        Ok(None) => {}
                        Err(e) => eprintln!("{}", e),
                    },
                    Some(Err(e)) => return Err(e).context("reading stdin"),
                    // EOF: keep following the feed.
                    None => stdin_open = false,
                }
            }
        }
    }

    let _ = write.send(Message::Close(None)).await;
    Ok(())
}
