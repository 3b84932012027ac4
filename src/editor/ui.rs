use derive_more::Display;

/// Text of the save status indicator next to the editor controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SaveStatus {
    #[display("READY")]
    Ready,
    #[display("Saving...")]
    Saving,
    #[display("SAVED")]
    Saved,
    #[display("FAILED TO SAVE")]
    Failed,
    #[display("Unsaved changes")]
    Unsaved,
    #[display("SELECTION UNAVAILABLE")]
    Unavailable,
}

/// What the controller needs from the admin page around the frame.
pub trait EditorUi {
    /// Blocking notification, like `alert`.
    fn notify(&self, message: &str);

    /// Asks for a line of text; `None` when the user cancels.
    fn prompt(&self, message: &str, default: &str) -> Option<String>;

    fn show_status(&self, status: SaveStatus);

    fn show_edit_label(&self, label: &str);
}
