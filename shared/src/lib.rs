//! Wire types shared between the Castlefall server and its display clients.

pub mod event;
pub mod messages;
pub mod room;
pub mod view;

pub use event::{EventEnvelope, EventKind, LeaveReason};
pub use messages::{ClientMsg, ServerMsg};
pub use room::{DeclarationState, ErrorCode, Phase, RoomSnapshot};
pub use view::RoomView;
