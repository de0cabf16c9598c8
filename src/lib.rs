pub mod cancel;
pub mod dispatcher;
pub mod link;
pub mod session;

pub use cancel::{CancelSource, CancelToken};
pub use dispatcher::{run_program, run_sequence, CommandSink, RunOutcome};
pub use link::{LinkConfig, LinkError, LinkStatus, RobotLink, DEFAULT_ENDPOINT};
pub use session::{DropReport, EditorSession, GhostPreview, SessionError};
