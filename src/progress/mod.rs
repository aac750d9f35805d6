//! Progress reporting: the sink contract runs report through, plus a polling store
//! for hosts that serve status to clients.

pub mod event;
pub mod session;
pub mod sink;
pub mod store;

pub use event::{ProgressEvent, ProgressSnapshot};
pub use session::{new_session_id, now_millis, unique_id, PrunePolicy, SessionStatus};
pub use sink::{FanOut, ProgressLog, ProgressSink, TracingProgress};
pub use store::{ProgressStore, SessionRecord, SessionSink};
