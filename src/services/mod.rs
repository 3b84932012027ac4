pub mod assets;
pub mod document;
pub mod remote;

pub use self::assets::UploadService;
pub use self::document::DocumentService;
pub use self::remote::{CommitError, RemoteCommitService};
