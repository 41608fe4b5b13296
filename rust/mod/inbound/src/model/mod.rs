mod catalog;
mod entry;
mod report;
mod summary;

pub use catalog::*;
pub use entry::*;
pub use report::*;
pub use summary::*;
