//! Admin-side editing of the live page: the controller state machine, the
//! document model it mutates, and the seams to the server and the page UI.

pub mod backend;
pub mod controller;
pub mod dom;
pub mod ui;

pub use self::backend::{EditorBackend, HttpEditorBackend, UploadFile};
pub use self::controller::{
    EditorController, EditorError, EditorMode, Frame, Layout, Rect, SelectMode, Size, Surface,
};
pub use self::dom::{HtmlDocument, NodeData, NodeId};
pub use self::ui::{EditorUi, SaveStatus};
