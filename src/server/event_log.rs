//! Per-room append-only event log with replayable subscriptions.
//!
//! Entries are kept for the room's lifetime. A subscriber is a cursor over
//! the log: it first yields everything from its starting sequence, then
//! parks on a `watch` channel until the next append. Nothing is ever dropped
//! for a slow reader because readers pull from the log itself.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::{watch, RwLock};

use crate::game::{unix_millis, RoomEvent, RoomEventKind};

pub type EventStream = BoxStream<'static, Arc<RoomEvent>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Head {
    seq: u64,
    closed: bool,
}

#[derive(Debug)]
pub struct EventLog {
    entries: Arc<RwLock<Vec<Arc<RoomEvent>>>>,
    head: watch::Sender<Head>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        let (head, _rx) = watch::channel(Head::default());
        Self {
            entries: Arc::default(),
            head,
        }
    }

    /// Append `kind` as the next event. Sequence numbers start at 1 with no gaps.
    pub async fn append(&self, room: &str, kind: RoomEventKind) -> Arc<RoomEvent> {
        let mut entries = self.entries.write().await;
        let seq = entries.len() as u64 + 1;
        let event = Arc::new(RoomEvent {
            room: room.to_string(),
            seq,
            timestamp_ms: unix_millis(),
            kind,
        });
        entries.push(Arc::clone(&event));
        // Publish while still holding the write lock so `head` never goes backwards.
        self.head.send_modify(|h| h.seq = seq);
        event
    }

    /// Last issued sequence number, 0 when nothing has been appended.
    pub fn head(&self) -> u64 {
        self.head.borrow().seq
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Copy of the entries in `[from, head]`.
    pub async fn range(&self, from: u64) -> Vec<Arc<RoomEvent>> {
        let start = from.max(1) as usize - 1;
        let entries = self.entries.read().await;
        entries.get(start..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// End every subscription once it has drained the log.
    pub fn close(&self) {
        self.head.send_modify(|h| h.closed = true);
    }

    /// Events with `seq >= from` in order, then live ones as they are appended.
    pub fn subscribe(&self, from: u64) -> EventStream {
        let entries = Arc::clone(&self.entries);
        let rx = self.head.subscribe();
        let next = from.max(1);

        stream::unfold((entries, rx, next), |(entries, mut rx, next)| async move {
            let idx = (next - 1) as usize;
            loop {
                // Mark the head as seen before reading, so an append in between
                // still wakes `changed()` below.
                let closed = rx.borrow_and_update().closed;
                let found = entries.read().await.get(idx).cloned();
                if let Some(event) = found {
                    return Some((event, (entries, rx, next + 1)));
                }
                if closed {
                    return None;
                }
                if rx.changed().await.is_err() {
                    // Log dropped: hand out whatever was appended before it went away.
                    let last = entries.read().await.get(idx).cloned();
                    return last.map(|event| (event, (entries, rx, next + 1)));
                }
            }
        })
        .boxed()
    }
}
