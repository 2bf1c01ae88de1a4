//! # Protocol Vocabulary
//!
//! Purpose: Name every token that crosses the wire between the client and
//! the bloomd daemon, so encoders and parsers never spell literals twice.
//!
//! ## Design Principles
//!
//! 1. **Line Oriented**: Every request is one line terminated by `\n`.
//! 2. **Two Response Shapes**: A reply is either a single line or a block
//!    framed by [`BLOCK_START`] and [`BLOCK_END`] lines.
//! 3. **Stable Literals**: Status strings are matched byte-for-byte.
//!
//! ## Request / Response Table
//!
//! ```text
//! +--------+---------------------------------------------------+------------------------------+
//! | verb   | request                                           | success response             |
//! +--------+---------------------------------------------------+------------------------------+
//! | create | create <name> [capacity=N] [prob=P] [in_memory=1] | Done / Exists                |
//! | drop   | drop <name>                                       | Done / Filter does not exist |
//! | close  | close <name>                                      | Done                         |
//! | clear  | clear <name>                                      | Done                         |
//! | set    | s <name> <key>                                    | Yes / No                     |
//! | check  | c <name> <key>                                    | Yes / No                     |
//! | bulk   | b <name> <key>...                                 | Yes/No list                  |
//! | multi  | m <name> <key>...                                 | Yes/No list                  |
//! | info   | info <name>                                       | START / key value / END      |
//! | list   | list [prefix]                                     | START / rows / END           |
//! | flush  | flush [name]                                      | Done                         |
//! +--------+---------------------------------------------------+------------------------------+
//! ```

use std::fmt;

/// First line of a block response.
pub const BLOCK_START: &str = "START";

/// Last line of a block response.
pub const BLOCK_END: &str = "END";

/// Generic success confirmation.
pub const RESPONSE_DONE: &str = "Done";

/// `create` on a name that is already present.
pub const RESPONSE_EXISTS: &str = "Exists";

/// `create` while the daemon is still deleting a filter of the same name.
pub const RESPONSE_DELETE_IN_PROGRESS: &str = "Delete in progress";

/// The named filter is absent.
pub const RESPONSE_FILTER_NOT_EXIST: &str = "Filter does not exist";

/// `clear` on a filter that is still resident in memory.
pub const RESPONSE_FILTER_NOT_PROXIED: &str = "Filter is not proxied. Close it first.";

/// Positive membership / newly added.
pub const RESPONSE_YES: &str = "Yes";

/// Negative membership / already present.
pub const RESPONSE_NO: &str = "No";

/// Default daemon port.
pub const DEFAULT_PORT: u16 = 8673;

/// Command verbs understood by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Create,
    Drop,
    Close,
    Clear,
    Set,
    Check,
    Bulk,
    Multi,
    Info,
    List,
    Flush,
}

impl Verb {
    /// Token written at the start of the request line.
    pub const fn token(self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Drop => "drop",
            Verb::Close => "close",
            Verb::Clear => "clear",
            Verb::Set => "s",
            Verb::Check => "c",
            Verb::Bulk => "b",
            Verb::Multi => "m",
            Verb::Info => "info",
            Verb::List => "list",
            Verb::Flush => "flush",
        }
    }

    /// Human readable name used in logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Drop => "drop",
            Verb::Close => "close",
            Verb::Clear => "clear",
            Verb::Set => "set",
            Verb::Check => "check",
            Verb::Bulk => "bulk",
            Verb::Multi => "multi",
            Verb::Info => "info",
            Verb::List => "list",
            Verb::Flush => "flush",
        }
    }

    /// Whether the daemon answers this verb with a block response.
    pub const fn expects_block(self) -> bool {
        matches!(self, Verb::Info | Verb::List)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
