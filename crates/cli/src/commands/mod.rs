pub mod diff;
pub mod options;

pub use diff::*;
pub use options::*;
