pub mod event_log;
pub mod http;
pub mod registry;
pub mod room;
pub mod run;
pub mod session;
pub mod sse;
pub mod state;
pub mod ws;

// Export commonly used types and functions
pub use event_log::{EventLog, EventStream};
pub use registry::RoomRegistry;
pub use room::{Room, RoomRules};
pub use run::{build_router, run_server, spawn_sweeper};
pub use session::{Attachment, ConnectionId, SessionKey, SessionManager};
pub use state::AppState;
