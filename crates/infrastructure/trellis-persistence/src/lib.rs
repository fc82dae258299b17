mod error;
mod maintenance;
mod snapshot;
mod storage;

pub use error::*;
pub use snapshot::*;
pub use storage::{sessions_root, FileSessionStorage, MemorySessionStorage, SessionStorage};
