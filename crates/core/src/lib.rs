//! ctfdiff-core
//!
//! Decoder for the Compact C Type Format (CTF) and a structural diff of the
//! function and variable signatures two CTF containers describe.
//!
//! The pipeline is: locate the `.SUNW_ctf` section and symbol table of an
//! object file ([`object`]), parse and optionally inflate the container
//! ([`format`], [`decompress`]), build the type graph and symbol lists
//! ([`container`]), then merge-diff two containers by symbol name
//! ([`diff`]) using the cycle-aware equality engine ([`compare`]).
//!
//! All substantive logic lives here so the CLI stays a thin frontend.

pub mod compare;
pub mod config;
pub mod container;
pub mod decompress;
pub mod diff;
pub mod error;
pub mod format;
pub mod object;
pub mod report;
pub mod types;

pub use compare::{compare, compare_all, CompareCache};
pub use config::{CompareOptions, DiffConfig};
pub use container::Container;
pub use diff::{diff_containers, SymbolDiff};
pub use error::{CtfError, CtfResult};
pub use report::DiffReport;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
