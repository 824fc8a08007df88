use std::io::IsTerminal;

use castlefall::pretty::{format_event_human, format_snapshot_human};
use castlefall_shared::{RoomView, ServerMsg};

/// Prints server messages and keeps the client's projection of the room.
pub struct MessagePrinter {
    json: bool,
    color: bool,
    view: Option<RoomView>,
}

impl MessagePrinter {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            color: std::io::stdout().is_terminal(),
            view: None,
        }
    }

    pub fn handle(&mut self, msg: &ServerMsg) {
        if self.json {
            match serde_json::to_string(msg) {
                Ok(txt) => println!("{}", txt),
                Err(e) => eprintln!("Failed to serialize message to JSON: {}", e),
            }
        }
        match msg {
            ServerMsg::Welcome {
                you,
                resumed,
                snapshot,
                ..
            } => {
                self.view = Some(RoomView::from_snapshot(snapshot.clone(), Some(you.clone())));
                if !self.json {
                    if *resumed {
                        println!("Resumed session as {}", you);
                    }
                    print!("{}", format_snapshot_human(snapshot, self.color));
                }
            }
            ServerMsg::Event(env) => {
                let fresh = match self.view.as_mut() {
                    Some(view) => view.apply(env),
                    None => true,
                };
                if fresh && !self.json {
                    let you = self.view.as_ref().and_then(|v| v.you.as_deref());
                    println!("{}", format_event_human(env, you, self.color));
                }
            }
            ServerMsg::Accepted { .. } => {}
            ServerMsg::Error { code, message } => {
                if !self.json {
                    eprintln!("Server error ({:?}): {}", code, message);
                }
            }
            ServerMsg::Kicked => {
                if !self.json {
                    println!("You were kicked from the room");
                }
            }
            ServerMsg::RoomClosed => {
                if !self.json {
                    println!("Room closed");
                }
            }
            ServerMsg::Pong => {
                if !self.json {
                    println!("Received pong");
                }
            }
        }
    }
}
