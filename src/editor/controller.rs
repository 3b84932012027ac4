use crate::domain::{MonotonicClock, SaveReceipt};
use crate::editor::backend::{EditorBackend, UploadFile};
use crate::editor::dom::{HtmlDocument, NodeId};
use crate::editor::ui::{EditorUi, SaveStatus};
use derive_more::Display;
use tracing::{debug, warn};

pub const OVERLAY_ID: &str = "admin-drop-overlay";
pub const REPLACED_SRC_ATTR: &str = "data-admin-replaced-src";
const TABINDEX_MARKER_ATTR: &str = "data-admin-tabindex";
const HIGHLIGHT_OUTLINE: &str = "2px dashed orange";

const CROSS_ORIGIN_MESSAGE: &str =
    "Unable to toggle edit mode. Make sure the iframe content is served from the same origin.";

const OVERLAY_STYLE: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("z-index", "999999"),
    ("display", "none"),
    ("pointer-events", "none"),
    ("background", "rgba(0,0,0,0.45)"),
    ("color", "#fff"),
    ("align-items", "center"),
    ("justify-content", "center"),
    ("text-align", "center"),
    ("font-size", "16px"),
    ("font-weight", "600"),
    ("border-radius", "6px"),
];

/// The page shown in the editor frame. Only a same-origin page can be
/// edited; a cross-origin one is opaque to the controller.
#[derive(Debug, Clone)]
pub enum Frame {
    SameOrigin(HtmlDocument),
    CrossOrigin { origin: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectMode {
    #[default]
    None,
    TextEditPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    View,
    Edit,
    SelectText,
}

/// What an element under the pointer can become.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    None,
    Text(NodeId),
    Image(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Geometry the host's rendering engine knows and the document model doesn't.
pub trait Layout {
    fn bounding_rect(&self, node: NodeId) -> Rect;
    fn scroll_offset(&self) -> (f64, f64);
    fn computed_size(&self, node: NodeId) -> Option<Size>;
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum EditorError {
    #[display("the editor frame is not same-origin")]
    CrossOrigin,
    #[display("no page is loaded in the editor frame")]
    NotLoaded,
    #[display("{_0}")]
    Backend(String),
}

impl std::error::Error for EditorError {}

// the element currently outlined, with its style attribute exactly as it was before
#[derive(Debug)]
struct Highlight {
    node: NodeId,
    prior_style: Option<String>,
}

/// Drives in-place editing of the framed page and persists it through an
/// [`EditorBackend`]. One controller per admin session; every operation
/// takes `&mut self`, so user actions apply strictly in event order.
pub struct EditorController<B: EditorBackend, U: EditorUi> {
    backend: B,
    ui: U,
    frame: Option<Frame>,
    editing: bool,
    select_mode: SelectMode,
    highlight: Option<Highlight>,
    overlay: Option<NodeId>,
    clock: MonotonicClock,
}

impl<B: EditorBackend, U: EditorUi> EditorController<B, U> {
    pub fn new(backend: B, ui: U) -> Self {
        Self {
            backend,
            ui,
            frame: None,
            editing: false,
            select_mode: SelectMode::None,
            highlight: None,
            overlay: None,
            clock: MonotonicClock::new(),
        }
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn select_mode(&self) -> SelectMode {
        self.select_mode
    }

    pub fn mode(&self) -> EditorMode {
        match (self.select_mode, self.editing) {
            (SelectMode::TextEditPending, _) => EditorMode::SelectText,
            (SelectMode::None, true) => EditorMode::Edit,
            (SelectMode::None, false) => EditorMode::View,
        }
    }

    pub fn document(&self) -> Option<&HtmlDocument> {
        match &self.frame {
            Some(Frame::SameOrigin(doc)) => Some(doc),
            _ => None,
        }
    }

    fn document_mut(&mut self) -> Result<&mut HtmlDocument, EditorError> {
        match self.frame.as_mut() {
            Some(Frame::SameOrigin(doc)) => Ok(doc),
            Some(Frame::CrossOrigin { .. }) => Err(EditorError::CrossOrigin),
            None => Err(EditorError::NotLoaded),
        }
    }

    // every selection handler goes through here so a cross-origin frame is reported, not ignored
    fn require_document(&mut self) -> Result<(), EditorError> {
        match self.document_mut() {
            Ok(_) => Ok(()),
            Err(EditorError::CrossOrigin) => {
                self.ui.notify(CROSS_ORIGIN_MESSAGE);
                Err(EditorError::CrossOrigin)
            }
            Err(e) => Err(e),
        }
    }

    /// Installs a freshly loaded page: editing off, no pending selection,
    /// status READY. A cross-origin page is accepted but reported.
    pub fn load(&mut self, frame: Frame) -> Result<(), EditorError> {
        self.frame = Some(frame);
        self.select_mode = SelectMode::None;
        self.highlight = None;
        self.overlay = None;
        self.editing = false;
        self.ui.show_edit_label("ENABLE EDITOR");

        match self.frame.as_mut() {
            Some(Frame::SameOrigin(doc)) => {
                doc.set_design_mode(false);
                self.ui.show_status(SaveStatus::Ready);
                Ok(())
            }
            Some(Frame::CrossOrigin { origin }) => {
                warn!("Selection handlers could not be attached to {}", origin);
                self.ui.notify(CROSS_ORIGIN_MESSAGE);
                self.ui.show_status(SaveStatus::Unavailable);
                Err(EditorError::CrossOrigin)
            }
            None => Err(EditorError::NotLoaded),
        }
    }

    /// Fetches the current Document from the backend and loads it.
    pub async fn load_from_backend(&mut self) -> Result<(), EditorError> {
        let html = self
            .backend
            .load_document()
            .await
            .map_err(|e| EditorError::Backend(format!("{:#}", e)))?;
        self.load(Frame::SameOrigin(HtmlDocument::parse(&html)))
    }

    /// Cache-busting address for reloading the frame.
    pub fn reload_url(&self) -> String {
        format!("/?t={}", self.clock.next_millis())
    }

    /// Throws away unsaved changes by loading the Document again.
    pub async fn reload(&mut self) -> Result<String, EditorError> {
        let url = self.reload_url();
        self.load_from_backend().await?;
        Ok(url)
    }

    pub fn set_editing(&mut self, enable: bool) -> Result<(), EditorError> {
        if let Err(e) = self.document_mut().map(|doc| doc.set_design_mode(enable)) {
            if e == EditorError::CrossOrigin {
                self.ui.notify(CROSS_ORIGIN_MESSAGE);
            }
            return Err(e);
        }

        self.editing = enable;
        self.ui.show_edit_label(if enable {
            "DISABLE EDITOR"
        } else {
            "ENABLE EDITOR"
        });
        Ok(())
    }

    /// Flips rich-text editing and returns the new state.
    pub fn toggle_edit(&mut self) -> Result<bool, EditorError> {
        let enable = !self.editing;
        self.set_editing(enable)?;
        Ok(enable)
    }

    /// Arms a one-shot text replacement: the next click picks the element.
    pub fn begin_text_selection(&mut self) -> Result<(), EditorError> {
        self.require_document()?;
        self.select_mode = SelectMode::TextEditPending;
        self.ui.notify("CLICK SOMETHING TO EDIT.");
        Ok(())
    }

    pub fn classify(&self, target: NodeId) -> Surface {
        let Some(doc) = self.document() else {
            return Surface::None;
        };

        if doc.tag_name(target).is_none() || !doc.is_attached(target) {
            return Surface::None;
        }

        match doc.closest(target, "img") {
            Some(img) => Surface::Image(img),
            None if is_page_frame(doc, target) => Surface::None,
            None => Surface::Text(target),
        }
    }

    /// Moves the hover outline to `target` while a selection is pending.
    pub fn pointer_move(&mut self, target: NodeId) -> Result<(), EditorError> {
        if self.select_mode == SelectMode::None {
            return Ok(());
        }
        self.require_document()?;

        if self.highlight.as_ref().map(|h| h.node) == Some(target) {
            return Ok(());
        }

        let previous = self.highlight.take();
        let doc = self.document_mut()?;

        if let Some(previous) = previous {
            restore_style(doc, previous);
        }

        if doc.tag_name(target).is_some() && !is_page_frame(doc, target) {
            let prior_style = doc.attribute(target, "style").map(str::to_string);
            doc.set_style_property(target, "outline", HIGHLIGHT_OUTLINE);
            self.highlight = Some(Highlight {
                node: target,
                prior_style,
            });
        }

        Ok(())
    }

    pub fn clear_highlight(&mut self) {
        let Some(highlight) = self.highlight.take() else {
            return;
        };
        if let Ok(doc) = self.document_mut() {
            restore_style(doc, highlight);
        }
    }

    /// Handles a click inside the page. Returns `true` when the click was
    /// consumed by a pending selection, which then ends whatever the user
    /// answered.
    pub fn click(&mut self, target: NodeId) -> Result<bool, EditorError> {
        if self.select_mode == SelectMode::None {
            return Ok(false);
        }
        self.require_document()?;

        // only text surfaces take a replacement; anything else just ends the selection
        let is_text = matches!(self.classify(target), Surface::Text(_));
        if self.select_mode == SelectMode::TextEditPending && is_text {
            let current = self
                .document()
                .map(|doc| doc.text_content(target))
                .unwrap_or_default();

            if let Some(replacement) = self
                .ui
                .prompt("Edit text (styles will be preserved).", &current)
            {
                self.document_mut()?.set_text_content(target, &replacement);
                self.ui.show_status(SaveStatus::Unsaved);
            }
        }

        self.select_mode = SelectMode::None;
        self.clear_highlight();
        Ok(true)
    }

    /// Shows the drop overlay over the image under the pointer, or hides it
    /// anywhere else. Drags without files are ignored.
    pub fn drag_over(
        &mut self,
        target: NodeId,
        has_file: bool,
        layout: &dyn Layout,
    ) -> Result<(), EditorError> {
        self.require_document()?;
        if !has_file {
            return Ok(());
        }

        let surface = self.classify(target);
        let overlay = self.ensure_overlay()?;
        let doc = self.document_mut()?;

        match surface {
            Surface::Image(img) => {
                let rect = layout.bounding_rect(img);
                let (scroll_x, scroll_y) = layout.scroll_offset();
                doc.set_style_property(overlay, "left", &px(rect.left + scroll_x));
                doc.set_style_property(overlay, "top", &px(rect.top + scroll_y));
                doc.set_style_property(overlay, "width", &px(rect.width));
                doc.set_style_property(overlay, "height", &px(rect.height));
                doc.set_style_property(overlay, "display", "flex");
            }
            _ => doc.set_style_property(overlay, "display", "none"),
        }

        Ok(())
    }

    /// Hides the overlay once the drag leaves the page content.
    pub fn drag_leave(&mut self, related: Option<NodeId>) -> Result<(), EditorError> {
        self.require_document()?;
        let Some(overlay) = self.overlay else {
            return Ok(());
        };

        let doc = self.document_mut()?;
        let left_page = match related {
            None => true,
            Some(node) => is_page_frame(doc, node),
        };
        if left_page {
            doc.set_style_property(overlay, "display", "none");
        }
        Ok(())
    }

    /// Handles a file dropped on the page. Returns the new image URL when
    /// an image was replaced.
    pub async fn drop_file(
        &mut self,
        target: NodeId,
        file: Option<UploadFile>,
        layout: &dyn Layout,
    ) -> Result<Option<String>, EditorError> {
        self.require_document()?;
        self.hide_overlay();

        let Some(file) = file else {
            return Ok(None);
        };

        match self.classify(target) {
            Surface::Image(img) => self.replace_image(img, file, layout).await.map(Some),
            _ => {
                self.ui
                    .notify("Drop the image directly onto an existing image to replace it.");
                Ok(None)
            }
        }
    }

    /// Uploads `file` and points `img` at it, pinning the current box size
    /// so the new picture doesn't shift the layout.
    pub async fn replace_image(
        &mut self,
        img: NodeId,
        file: UploadFile,
        layout: &dyn Layout,
    ) -> Result<String, EditorError> {
        // a pending hover restore would otherwise undo the pinned size
        self.clear_highlight();
        let computed = layout.computed_size(img);
        {
            let doc = self.document_mut()?;

            let width = numeric_attribute(doc, img, "width")
                .filter(|w| *w > 0.0)
                .or(computed.map(|s| s.width))
                .filter(|w| *w > 0.0);
            let height = numeric_attribute(doc, img, "height")
                .filter(|h| *h > 0.0)
                .or(computed.map(|s| s.height))
                .filter(|h| *h > 0.0);

            if let Some(width) = width {
                doc.set_style_property(img, "width", &px(width));
            }
            if let Some(height) = height {
                doc.set_style_property(img, "height", &px(height));
            }
            if doc.style_property(img, "object-fit").is_none() {
                doc.set_style_property(img, "object-fit", "cover");
            }
        }

        debug!("Uploading replacement image {}", file.name);
        let receipt = match self.backend.upload(file).await {
            Ok(receipt) => receipt,
            Err(e) => {
                let detail = format!("{:#}", e);
                self.ui.notify(&format!("Image replace failed: {}", detail));
                return Err(EditorError::Backend(detail));
            }
        };

        let doc = self.document_mut()?;
        doc.set_attribute(img, REPLACED_SRC_ATTR, &receipt.url);
        doc.set_attribute(img, "src", &receipt.url);

        self.ui.show_status(SaveStatus::Unsaved);
        self.ui
            .notify("Image replaced. Click Save to persist changes.");
        Ok(receipt.url)
    }

    /// Removes everything the editor injected into the page: the overlay,
    /// hover outlines, editing attributes and markers. Turns design mode off.
    pub fn strip_artifacts(&mut self) -> Result<(), EditorError> {
        let highlight = self.highlight.take();
        let overlay = self.overlay.take();
        let doc = self.document_mut()?;

        if let Some(highlight) = highlight {
            restore_style(doc, highlight);
        }

        if let Some(overlay) = overlay {
            doc.detach(overlay);
        }
        while let Some(stale) = doc.get_element_by_id(OVERLAY_ID) {
            doc.detach(stale);
        }

        for element in doc.elements() {
            if doc.style_property(element, "outline").as_deref() == Some(HIGHLIGHT_OUTLINE) {
                doc.set_style_property(element, "outline", "");
            }
            doc.remove_attribute(element, "contenteditable");
            if doc.has_attribute(element, TABINDEX_MARKER_ATTR) {
                doc.remove_attribute(element, "tabindex");
                doc.remove_attribute(element, TABINDEX_MARKER_ATTR);
            }
            doc.remove_attribute(element, REPLACED_SRC_ATTR);
        }

        doc.set_design_mode(false);
        Ok(())
    }

    /// Serializes the cleaned page and hands it to the backend. Failures are
    /// shown to the user and never retried.
    pub async fn save(&mut self) -> Result<SaveReceipt, EditorError> {
        self.ui.show_status(SaveStatus::Saving);

        let html = match self.serialize_clean() {
            Ok(html) => html,
            Err(e) => {
                self.report_save_failure(&e.to_string());
                return Err(e);
            }
        };

        match self.backend.save(html).await {
            Ok(receipt) => {
                self.ui.notify(&format!(
                    "CHANGES APPLIED {}",
                    receipt.backup.as_deref().unwrap_or("none")
                ));
                self.ui.show_status(SaveStatus::Saved);
                Ok(receipt)
            }
            Err(e) => {
                let detail = format!("{:#}", e);
                self.report_save_failure(&detail);
                Err(EditorError::Backend(detail))
            }
        }
    }

    /// The page as it would be saved right now.
    pub fn serialize_clean(&mut self) -> Result<String, EditorError> {
        self.strip_artifacts()?;

        let editing = self.editing;
        let doc = self.document_mut()?;
        let html = doc.serialize();
        // stripping switched design mode off; the live page keeps editing
        doc.set_design_mode(editing);
        Ok(html)
    }

    fn report_save_failure(&self, detail: &str) {
        self.ui.notify(&format!("Save failed: {}", detail));
        self.ui.show_status(SaveStatus::Failed);
    }

    // the overlay is created on first use and reused until the next save
    fn ensure_overlay(&mut self) -> Result<NodeId, EditorError> {
        if let Some(overlay) = self.overlay {
            return Ok(overlay);
        }

        let doc = self.document_mut()?;
        let overlay = match doc.get_element_by_id(OVERLAY_ID) {
            Some(existing) => existing,
            None => {
                let overlay = doc.create_element("div");
                doc.set_attribute(overlay, "id", OVERLAY_ID);
                for (property, value) in OVERLAY_STYLE {
                    doc.set_style_property(overlay, property, value);
                }
                doc.set_text_content(overlay, "Drop image to replace");
                let parent = doc
                    .body()
                    .or_else(|| doc.document_element())
                    .unwrap_or_else(|| doc.root());
                doc.append_child(parent, overlay);
                overlay
            }
        };

        self.overlay = Some(overlay);
        Ok(overlay)
    }

    fn hide_overlay(&mut self) {
        let Some(overlay) = self.overlay else {
            return;
        };
        if let Ok(doc) = self.document_mut() {
            doc.set_style_property(overlay, "display", "none");
        }
    }
}

// <html> and <body> are the frame of the page, never a selection target
fn is_page_frame(doc: &HtmlDocument, node: NodeId) -> bool {
    node == doc.root()
        || Some(node) == doc.document_element()
        || Some(node) == doc.body()
}

fn restore_style(doc: &mut HtmlDocument, highlight: Highlight) {
    match highlight.prior_style {
        Some(style) => doc.set_attribute(highlight.node, "style", &style),
        None => doc.remove_attribute(highlight.node, "style"),
    }
}

fn numeric_attribute(doc: &HtmlDocument, node: NodeId, name: &str) -> Option<f64> {
    doc.attribute(node, name)?
        .trim()
        .trim_end_matches("px")
        .parse::<f64>()
        .ok()
}

fn px(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}px", value as i64)
    } else {
        format!("{}px", value)
    }
}
