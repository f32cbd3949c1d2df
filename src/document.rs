use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::error::{ParseError, ProjectError, Result};
use crate::xml::{NodeId, XmlTree};

/// Tag name of the project root element.
pub const ROOT_ELEMENT: &str = "NUnitProject";

/// Extension recognised by [`is_project_file`] unless configured otherwise.
pub const DEFAULT_EXTENSION: &str = "nunit";

/// Text loaded by [`ProjectDocument::create_new_project`] unless configured
/// otherwise.
pub const NEW_PROJECT_XML: &str = "<NUnitProject />";

/// True if `path` carries the default project-file extension (any case).
pub fn is_project_file(path: impl AsRef<Path>) -> bool {
    has_extension(path.as_ref(), DEFAULT_EXTENSION)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Notifications
// ═══════════════════════════════════════════════════════════════════════════════

/// Lifecycle and change notifications delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentEvent {
    /// A project became the active one (new or opened).
    Created,
    /// The active project was closed or replaced.
    Closed,
    /// The tree or the raw text changed.
    Changed,
}

/// Handle returned by [`ProjectDocument::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(DocumentEvent)>;

// ═══════════════════════════════════════════════════════════════════════════════
//  ProjectDocument – top-level handle
// ═══════════════════════════════════════════════════════════════════════════════

/// An in-memory project file.
///
/// The raw text is always kept.  When it parses, an owned [`XmlTree`] backs
/// the structured views ([`configs`](Self::configs),
/// [`settings`](Self::settings), …); when it does not, the document is
/// invalid, the parse error is stored in [`last_error`](Self::last_error) and
/// every structured read returns an empty or default value.
///
/// Every structural mutation re-serializes the tree into the text, marks the
/// document dirty and dispatches exactly one [`DocumentEvent::Changed`] to
/// subscribers, synchronously and in registration order.  Mutations made
/// inside [`batch`](Self::batch) (or between
/// [`begin_update`](Self::begin_update) and [`end_update`](Self::end_update))
/// are reported by a single `Changed` when the outermost scope closes.
pub struct ProjectDocument {
    path: Option<PathBuf>,
    text: String,
    tree: Option<XmlTree>,
    last_error: Option<ParseError>,
    has_unsaved_changes: bool,
    is_open: bool,
    extension: String,
    new_project_text: String,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    update_depth: usize,
    change_pending: bool,
}

impl Default for ProjectDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProjectDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectDocument")
            .field("path", &self.path)
            .field("is_open", &self.is_open)
            .field("is_valid", &self.is_valid())
            .field("has_unsaved_changes", &self.has_unsaved_changes)
            .field("last_error", &self.last_error)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ProjectDocument {
    /// An empty, closed document with no text and no tree.
    pub fn new() -> Self {
        Self {
            path: None,
            text: String::new(),
            tree: None,
            last_error: None,
            has_unsaved_changes: false,
            is_open: false,
            extension: DEFAULT_EXTENSION.to_string(),
            new_project_text: NEW_PROJECT_XML.to_string(),
            listeners: Vec::new(),
            next_subscription: 0,
            update_depth: 0,
            change_pending: false,
        }
    }

    pub fn builder() -> ProjectDocumentBuilder {
        ProjectDocumentBuilder::new()
    }

    // ─── State ───────────────────────────────────────────────────────────

    /// The raw text: exactly what was last loaded or assigned, or the
    /// serialized tree after a structural mutation.
    pub fn xml_text(&self) -> &str {
        &self.text
    }

    /// True when the text parsed.
    pub fn is_valid(&self) -> bool {
        self.tree.is_some()
    }

    /// The parse error from the last load, if it failed.
    pub fn last_error(&self) -> Option<&ParseError> {
        self.last_error.as_ref()
    }

    /// The unexpected root element name when the text parsed but is not a
    /// project.
    pub fn schema_mismatch(&self) -> Option<&str> {
        let tree = self.tree.as_ref()?;
        let name = tree.name(tree.root());
        (name != ROOT_ELEMENT).then_some(name)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    /// True between a successful create/open and the matching close.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn project_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_project_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    /// The project file name without extension.
    pub fn name(&self) -> Option<String> {
        self.path
            .as_deref()
            .and_then(Path::file_stem)
            .map(|s| s.to_string_lossy().into_owned())
    }

    /// True if `path` carries this document's project-file extension.
    pub fn is_project_file(&self, path: impl AsRef<Path>) -> bool {
        has_extension(path.as_ref(), &self.extension)
    }

    /// True if the project could be saved to `path` without asking for
    /// another one: the path is absolute, has the project extension, and
    /// either does not exist yet or is not read-only.
    pub fn is_valid_writable_project_path(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if !path.is_absolute() || !self.is_project_file(path) {
            return false;
        }
        match std::fs::metadata(path) {
            Ok(meta) => !meta.permissions().readonly(),
            Err(_) => true,
        }
    }

    /// The tree, if the document is valid and its root is a project.
    pub(crate) fn tree(&self) -> Option<&XmlTree> {
        self.tree
            .as_ref()
            .filter(|t| t.name(t.root()) == ROOT_ELEMENT)
    }

    // ─── Loading ─────────────────────────────────────────────────────────

    /// Replace the text and try to parse it.
    ///
    /// On failure the text is still kept so it can be corrected; the tree is
    /// dropped and the error stored.  No notification is sent and the dirty
    /// flag is left alone.
    pub fn load_xml(&mut self, text: impl Into<String>) {
        self.text = text.into();
        match XmlTree::parse(&self.text) {
            Ok(tree) => {
                let root = tree.name(tree.root());
                if root != ROOT_ELEMENT {
                    warn!(root, "project text has an unexpected root element");
                }
                self.tree = Some(tree);
                self.last_error = None;
            }
            Err(error) => {
                warn!(line = error.line, column = error.column, "project text is not well-formed: {}", error.message);
                self.tree = None;
                self.last_error = Some(error);
            }
        }
    }

    /// Read and parse a project file, replacing the current content.
    ///
    /// An I/O failure leaves the document untouched.  Text that does not
    /// parse is kept (see [`load_xml`](Self::load_xml)).
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))?;
        self.load_xml(text);
        self.path = Some(path.to_path_buf());
        self.has_unsaved_changes = false;
        debug!(path = %path.display(), valid = self.is_valid(), "loaded project");
        Ok(())
    }

    /// Replace the whole text, as a raw-text editor does when its edits are
    /// flushed.  Marks the document dirty and sends one `Changed`, whether or
    /// not the new text parses.  Assigning identical text does nothing.
    pub fn set_xml_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.text {
            return;
        }
        self.load_xml(text);
        self.mark_changed();
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Start a new project named `Project<N>` in the current directory.
    pub fn create_new_project(&mut self) -> Result<()> {
        let dir = std::env::current_dir().map_err(|e| ProjectError::io(".", e))?;
        self.create_new_project_in(&dir);
        Ok(())
    }

    /// Start a new project named `Project<N>` in `dir`, using the first `N`
    /// for which no file exists yet.
    pub fn create_new_project_in(&mut self, dir: impl AsRef<Path>) {
        let dir = dir.as_ref();
        let path = (1..)
            .map(|n| dir.join(format!("Project{n}.{}", self.extension)))
            .find(|p| !p.exists())
            .unwrap_or_else(|| dir.join(format!("Project.{}", self.extension)));

        self.close_project();
        let text = self.new_project_text.clone();
        self.load_xml(text);
        self.path = Some(path);
        self.has_unsaved_changes = false;
        self.is_open = true;
        debug!(path = ?self.path, "created new project");
        self.emit(DocumentEvent::Created);
    }

    /// Open a project file, closing any open project first.
    ///
    /// The file is read before anything else happens, so an I/O error
    /// leaves the current project open and unchanged.  A file that does not
    /// parse still opens, invalid, so its text can be fixed.
    pub fn open_project(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))?;

        self.close_project();
        self.load_xml(text);
        self.path = Some(path.to_path_buf());
        self.has_unsaved_changes = false;
        self.is_open = true;
        debug!(path = %path.display(), valid = self.is_valid(), "opened project");
        self.emit(DocumentEvent::Created);
        Ok(())
    }

    /// Close the open project, if any, and reset to empty.
    pub fn close_project(&mut self) {
        if !self.is_open {
            return;
        }
        debug!(path = ?self.path, "closing project");
        self.emit(DocumentEvent::Closed);

        self.path = None;
        self.text.clear();
        self.tree = None;
        self.last_error = None;
        self.has_unsaved_changes = false;
        self.is_open = false;
        self.update_depth = 0;
        self.change_pending = false;
    }

    // ─── Saving ──────────────────────────────────────────────────────────

    /// Save to the current project path.
    pub fn save(&mut self) -> Result<()> {
        let path = self.path.clone().ok_or(ProjectError::NoProjectPath)?;
        self.save_as(path)
    }

    /// Write the document to `path`, which becomes the project path.
    /// Invalid documents cannot be saved.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if !self.is_valid() {
            return Err(ProjectError::InvalidDocument);
        }
        let path = path.as_ref();
        std::fs::write(path, &self.text).map_err(|e| ProjectError::io(path, e))?;

        self.path = Some(path.to_path_buf());
        self.has_unsaved_changes = false;
        debug!(path = %path.display(), "saved project");
        Ok(())
    }

    // ─── Subscribers ─────────────────────────────────────────────────────

    /// Register a callback for [`DocumentEvent`]s.  Callbacks run
    /// synchronously in registration order.
    pub fn subscribe(&mut self, listener: impl FnMut(DocumentEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback.  Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(i, _)| *i != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: DocumentEvent) {
        trace!(?event, listeners = self.listeners.len(), "dispatching document event");
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    // ─── Update scopes ───────────────────────────────────────────────────

    /// Defer `Changed` notifications until the matching
    /// [`end_update`](Self::end_update).  Scopes nest.
    pub fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    /// Close an update scope.  Closing the outermost scope sends one
    /// `Changed` if anything changed inside it.
    pub fn end_update(&mut self) {
        if self.update_depth == 0 {
            return;
        }
        self.update_depth -= 1;
        if self.update_depth == 0 && self.change_pending {
            self.change_pending = false;
            self.emit(DocumentEvent::Changed);
        }
    }

    /// Run `f` inside an update scope.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_update();
        let result = f(self);
        self.end_update();
        result
    }

    fn mark_changed(&mut self) {
        self.has_unsaved_changes = true;
        if self.update_depth > 0 {
            self.change_pending = true;
        } else {
            self.emit(DocumentEvent::Changed);
        }
    }

    // ─── Structural mutation ─────────────────────────────────────────────

    /// Apply one logical mutation to the tree: re-serialize, mark dirty and
    /// notify once.
    pub(crate) fn modify<R>(&mut self, f: impl FnOnce(&mut XmlTree) -> R) -> Result<R> {
        let tree = self.tree.as_mut().ok_or(ProjectError::InvalidDocument)?;
        let root = tree.name(tree.root());
        if root != ROOT_ELEMENT {
            return Err(ProjectError::SchemaMismatch { found: root.to_string() });
        }

        let result = f(tree);
        self.text = tree.to_xml();
        self.mark_changed();
        Ok(result)
    }

    /// Set or remove one attribute.  Writing the value already stored is
    /// not a change and sends nothing.
    pub(crate) fn set_attribute(&mut self, node: NodeId, name: &str, value: Option<&str>) -> Result<()> {
        let tree = self.tree().ok_or(ProjectError::InvalidDocument)?;
        if tree.attribute(node, name) == value {
            return Ok(());
        }
        trace!(attribute = name, ?value, "setting attribute");
        self.modify(|tree| match value {
            Some(v) => tree.set_attribute(node, name, v),
            None => {
                tree.remove_attribute(node, name);
            }
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  ProjectDocumentBuilder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for a [`ProjectDocument`] with non-default settings.
///
/// # Example
/// ```
/// use nunitproj_rs::ProjectDocument;
///
/// let doc = ProjectDocument::builder()
///     .extension("nproj")
///     .load_xml(r#"<NUnitProject><Config name="Debug" /></NUnitProject>"#);
/// assert!(doc.is_valid());
/// assert!(doc.is_project_file("tests.NPROJ"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProjectDocumentBuilder {
    path: Option<PathBuf>,
    extension: Option<String>,
    new_project_text: Option<String>,
}

impl ProjectDocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Project-file extension, without the dot.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Template text for [`ProjectDocument::create_new_project`].
    pub fn new_project_text(mut self, text: impl Into<String>) -> Self {
        self.new_project_text = Some(text.into());
        self
    }

    pub fn build(self) -> ProjectDocument {
        let mut doc = ProjectDocument::new();
        doc.path = self.path;
        if let Some(extension) = self.extension {
            doc.extension = extension;
        }
        if let Some(text) = self.new_project_text {
            doc.new_project_text = text;
        }
        doc
    }

    pub fn load_xml(self, text: impl Into<String>) -> ProjectDocument {
        let mut doc = self.build();
        doc.load_xml(text);
        doc
    }

    pub fn open(self, path: impl AsRef<Path>) -> Result<ProjectDocument> {
        let mut doc = self.build();
        doc.open_project(path)?;
        Ok(doc)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
