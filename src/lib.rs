//! Package implement a copy-on-write btree index embedded inside an
//! append-only log of blocks.
//!
//! The log is the only persistence. Each mutation appends exactly one
//! block carrying the application's `{key, value}` payload along with a
//! serialized snapshot of the btree nodes that changed under that
//! mutation, called the embedded index. Nodes that did not change are
//! shared with older blocks by `(seq, offset)` reference, where `seq`
//! addresses a block in the log and `offset` addresses a node inside
//! that block's embedded index. The root of the current tree is always
//! the node at offset ZERO of the last block's index.
//!
//! **Inventory of features**
//!
//! * Point lookups and full in-order iteration, keys ordered by their
//!   lexicographic byte order.
//! * One log append per mutation, which makes every [Tree::put] atomic,
//!   a failed mutation leaves the log untouched.
//! * Keys and subtrees are decoded lazily while traversing, a
//!   per-operation block cache guarantees that no block is read from
//!   the log more than once for a single operation.
//! * Storage is pluggable via the [Log] trait. [MemLog] keeps blocks on
//!   the heap, [Journal] keeps them in a single append-only file.
//!
//! Mutations must be serialized by the application, one writer at a
//! time. Readers see the snapshot that was current when they began,
//! subsequent appends do not disturb an iteration in progress.

use std::{error, fmt, result};

/// Short form to compose Error values.
///
/// Here are few possible ways:
///
/// ```ignore
/// use crate::Error;
/// err_at!(Corrupt, msg: "bad index blob")
/// ```
///
/// ```ignore
/// use crate::Error;
/// err_at!(IOError, std::fs::File::open("delete-me"))
/// ```
///
/// ```ignore
/// use crate::Error;
/// err_at!(IOError, std::fs::File::open("delete-me"), "for reading")
/// ```
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err(Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err(Error::$v(prefix, format!("{}", err)))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                let msg = format!($($arg),+);
                Err(Error::$v(prefix, format!("{} {}", err, msg)))
            }
        }
    }};
}

mod util;

mod alog;
mod batch;
mod block;
mod journal;
mod node;
mod scan;
mod tree;
mod wire;

pub use crate::alog::{Log, MemLog};
pub use crate::block::Block;
pub use crate::journal::{Config, Journal};
pub use crate::scan::Iter;
pub use crate::tree::Tree;

/// Error variants that can be returned by this package's API.
///
/// Each variant carries a prefix, typically identifying the
/// error location.
pub enum Error {
    Fatal(String, String),
    IOError(String, String),
    FailConvert(String, String),
    FailCbor(String, String),
    Corrupt(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use Error::*;

        match self {
            Fatal(p, msg) => write!(f, "{} Fatal: {}", p, msg),
            IOError(p, msg) => write!(f, "{} IOError: {}", p, msg),
            FailConvert(p, msg) => write!(f, "{} FailConvert: {}", p, msg),
            FailCbor(p, msg) => write!(f, "{} FailCbor: {}", p, msg),
            Corrupt(p, msg) => write!(f, "{} Corrupt: {}", p, msg),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{}", self)
    }
}

impl error::Error for Error {}

/// Type alias for Result returns from this package's API.
pub type Result<T> = result::Result<T, Error>;
