//! FTP probing.
//!
//! This module provides:
//! - A minimal FTP client (login, `CWD`, passive `LIST`, `QUIT`)
//! - Directory listing parsing for Unix and DOS layouts
//! - A per-run directory cache shared by concurrent groups
//! - The group prober used by the orchestrator
//!
//! Files are never downloaded. A file is reachable when its parent directory
//! lists it; type and encoding are guessed from its name.

mod cache;
mod listing;
mod mime;
mod prober;
mod session;

pub use cache::DirectoryCache;
pub use listing::{parse_line, EntryKind, FileEntry, Listing, RawEntry};
pub use mime::guess_type;
pub use prober::{FtpProbe, FtpProber};
pub use session::{parse_pasv_port, read_reply, FtpConnector, FtpSession, Reply, TcpFtpConnector};
