//! ledis-protocol: the textual command surface.
//!
//! One command per line; tokens are whitespace-separated, the first
//! token is the case-insensitive opcode, and quoting is not supported.
//! Each opcode carries a stable wire number that doubles as the record
//! tag in snapshot files, so the table here is load-bearing for the
//! on-disk format.
//!
//! # quick start
//!
//! ```
//! use ledis_protocol::{Command, Opcode, Reply};
//!
//! let cmd = Command::parse("SET greeting hello").unwrap();
//! assert_eq!(cmd.opcode(), Opcode::Set);
//! assert_eq!(cmd.args(), ["greeting", "hello"]);
//!
//! assert_eq!(Reply::Ok.to_string(), "OK");
//! ```

pub mod command;
pub mod error;
pub mod reply;

pub use command::{Command, Opcode};
pub use error::ProtocolError;
pub use reply::Reply;
