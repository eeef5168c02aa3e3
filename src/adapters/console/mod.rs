//! Console Adapter - JSON Lines Front End
//!
//! Reads one request per line, dispatches it to the registry and writes
//! one reply per line. Callers identify themselves in each request.

pub mod protocol;
pub mod session;

pub use protocol::{Command, Reply, ReplyError};
pub use session::{MemoryRegistry, Session};
