//! Project-wide settings stored on the `<Settings>` element.
//!
//! The element is optional.  Reads on a project without it return defaults;
//! the first write creates it as the root's first child.

use std::fmt;
use std::str::FromStr;

use crate::attribute::{Parsed, parse_enum_or_default, parse_or_default, parse_bool};
use crate::document::ProjectDocument;
use crate::error::{ProjectError, Result};
use crate::path_utils;
use crate::xml::{NodeId, XmlTree};

pub(crate) const SETTINGS_ELEMENT: &str = "Settings";
pub(crate) const ACTIVE_CONFIG_ATTR: &str = "activeconfig";

pub(crate) fn settings_node(tree: &XmlTree) -> Option<NodeId> {
    tree.child_named(tree.root(), SETTINGS_ELEMENT)
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Enums
// ═══════════════════════════════════════════════════════════════════════════════

/// How test assemblies are distributed over processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProcessModel {
    #[default]
    Default,
    Single,
    Separate,
    Multiple,
}

impl ProcessModel {
    pub const ALL: [ProcessModel; 4] = [
        ProcessModel::Default,
        ProcessModel::Single,
        ProcessModel::Separate,
        ProcessModel::Multiple,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessModel::Default => "Default",
            ProcessModel::Single => "Single",
            ProcessModel::Separate => "Separate",
            ProcessModel::Multiple => "Multiple",
        }
    }
}

impl fmt::Display for ProcessModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ProcessModel::ALL
            .into_iter()
            .find(|m| s.trim().eq_ignore_ascii_case(m.as_str()))
            .ok_or_else(|| format!("unknown process model '{s}'"))
    }
}

/// How test assemblies are distributed over application domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DomainUsage {
    #[default]
    Default,
    Single,
    Multiple,
}

impl DomainUsage {
    pub const ALL: [DomainUsage; 3] = [DomainUsage::Default, DomainUsage::Single, DomainUsage::Multiple];

    pub fn as_str(self) -> &'static str {
        match self {
            DomainUsage::Default => "Default",
            DomainUsage::Single => "Single",
            DomainUsage::Multiple => "Multiple",
        }
    }
}

impl fmt::Display for DomainUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainUsage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        DomainUsage::ALL
            .into_iter()
            .find(|d| s.trim().eq_ignore_ascii_case(d.as_str()))
            .ok_or_else(|| format!("unknown domain usage '{s}'"))
    }
}

/// Domain usages that make sense under `process_model`.  One domain per
/// assembly is pointless when each assembly already gets its own process.
pub fn domain_usage_options(process_model: ProcessModel) -> Vec<DomainUsage> {
    match process_model {
        ProcessModel::Multiple => vec![DomainUsage::Default, DomainUsage::Single],
        _ => DomainUsage::ALL.to_vec(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Read view
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-only view of the project settings.
#[derive(Debug, Clone, Copy)]
pub struct ProjectSettings<'a> {
    doc: &'a ProjectDocument,
}

impl<'a> ProjectSettings<'a> {
    fn attribute(&self, name: &str) -> Option<&'a str> {
        let tree = self.doc.tree()?;
        tree.attribute(settings_node(tree)?, name)
    }

    /// Stored project base directory, `/`-separated.
    pub fn base_path(&self) -> Option<String> {
        self.attribute("appbase").map(path_utils::standardize_separators)
    }

    /// The stored base resolved against the project file's directory, or
    /// that directory alone when no base is stored.
    pub fn effective_base_path(&self) -> Option<String> {
        let project_dir = self
            .doc
            .project_path()
            .and_then(|p| p.parent())
            .map(|d| path_utils::standardize_separators(&d.to_string_lossy()));

        match (self.base_path(), project_dir) {
            (Some(base), Some(dir)) => Some(path_utils::combine(&dir, &base)),
            (Some(base), None) => Some(base),
            (None, dir) => dir,
        }
    }

    pub fn auto_config_parsed(&self) -> Parsed<bool> {
        parse_or_default("autoconfig", self.attribute("autoconfig"), false, parse_bool)
    }

    pub fn auto_config(&self) -> bool {
        self.auto_config_parsed().value
    }

    /// The `activeconfig` attribute exactly as stored, even if it names no
    /// configuration.
    pub fn stored_active_config_name(&self) -> Option<&'a str> {
        self.attribute(ACTIVE_CONFIG_ATTR)
    }

    /// The active configuration: the stored name if a configuration by that
    /// name exists, otherwise the first configuration, otherwise none.
    pub fn active_config_name(&self) -> Option<&'a str> {
        let configs = self.doc.configs();
        self.stored_active_config_name()
            .filter(|name| configs.contains(name))
            .or_else(|| configs.get(0).and_then(|c| c.name()))
    }

    pub fn process_model_parsed(&self) -> Parsed<ProcessModel> {
        parse_enum_or_default("processModel", self.attribute("processModel"), ProcessModel::Default)
    }

    pub fn process_model(&self) -> ProcessModel {
        self.process_model_parsed().value
    }

    pub fn domain_usage_parsed(&self) -> Parsed<DomainUsage> {
        parse_enum_or_default("domainUsage", self.attribute("domainUsage"), DomainUsage::Default)
    }

    pub fn domain_usage(&self) -> DomainUsage {
        self.domain_usage_parsed().value
    }

    /// [`domain_usage_options`] for the current process model.
    pub fn domain_usage_options(&self) -> Vec<DomainUsage> {
        domain_usage_options(self.process_model())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Mutable view
// ═══════════════════════════════════════════════════════════════════════════════

/// Mutable view of the project settings.  Every setter is one logical
/// mutation.
#[derive(Debug)]
pub struct ProjectSettingsMut<'a> {
    doc: &'a mut ProjectDocument,
}

impl<'a> ProjectSettingsMut<'a> {
    pub fn as_settings(&self) -> ProjectSettings<'_> {
        ProjectSettings { doc: &*self.doc }
    }

    fn set(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        let tree = self.doc.tree().ok_or_else(|| invalid(&*self.doc))?;
        match (settings_node(tree), value) {
            (Some(node), _) => self.doc.set_attribute(node, name, value),
            (None, None) => Ok(()),
            (None, Some(value)) => self.doc.modify(|tree| {
                let root = tree.root();
                let node = tree.prepend_element(root, SETTINGS_ELEMENT);
                tree.set_attribute(node, name, value);
            }),
        }
    }

    /// Set or clear the project base directory.  Separators are stored as
    /// `/`.
    pub fn set_base_path(&mut self, path: Option<&str>) -> Result<()> {
        let path = path.map(checked_path).transpose()?;
        self.set("appbase", path.as_deref())
    }

    pub fn set_auto_config(&mut self, auto_config: bool) -> Result<()> {
        self.set("autoconfig", Some(if auto_config { "True" } else { "False" }))
    }

    /// Select the active configuration.  A name that matches no
    /// configuration clears the stored value instead.
    pub fn set_active_config_name(&mut self, name: Option<&str>) -> Result<()> {
        let name = name.filter(|n| self.doc.configs().contains(n));
        self.set(ACTIVE_CONFIG_ATTR, name)
    }

    pub fn set_process_model(&mut self, model: ProcessModel) -> Result<()> {
        self.set("processModel", Some(model.as_str()))
    }

    pub fn set_domain_usage(&mut self, usage: DomainUsage) -> Result<()> {
        self.set("domainUsage", Some(usage.as_str()))
    }
}

/// The error `modify` would report for a document without a usable tree.
pub(crate) fn invalid(doc: &ProjectDocument) -> ProjectError {
    match doc.schema_mismatch() {
        Some(found) => ProjectError::SchemaMismatch { found: found.to_string() },
        None => ProjectError::InvalidDocument,
    }
}

/// Reject syntactically invalid paths, otherwise standardize separators.
pub(crate) fn checked_path(path: &str) -> Result<String> {
    match path_utils::invalid_path_reason(path) {
        Some(reason) => Err(ProjectError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(path_utils::standardize_separators(path)),
    }
}

impl ProjectDocument {
    pub fn settings(&self) -> ProjectSettings<'_> {
        ProjectSettings { doc: self }
    }

    pub fn settings_mut(&mut self) -> ProjectSettingsMut<'_> {
        ProjectSettingsMut { doc: self }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
