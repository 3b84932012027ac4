pub mod clock;
pub mod document;
pub mod naming;

pub use self::clock::MonotonicClock;
pub use self::document::{CommitReceipt, SaveReceipt, UploadReceipt};
