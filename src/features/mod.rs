pub mod document;
pub mod error;
pub mod functions;
pub mod uploads;

pub use self::error::ApiError;
