//! Configurations and their assembly lists.
//!
//! All handles here are projections over the document's tree: they carry a
//! [`NodeId`] and re-read the tree on every query, so there is nothing to
//! keep in sync.  Read views borrow the document shared; the `*Mut` views
//! borrow it exclusively and route every write through one document
//! mutation (one `Changed` notification).

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::attribute::{Parsed, parse_enum_or_default, parse_or_default};
use crate::document::ProjectDocument;
use crate::error::{ProjectError, Result};
use crate::path_utils;
use crate::runtime::{RuntimeFramework, parse_runtime_framework};
use crate::settings::{ACTIVE_CONFIG_ATTR, checked_path, invalid, settings_node};
use crate::xml::{NodeId, XmlTree};

const CONFIG_ELEMENT: &str = "Config";
const ASSEMBLY_ELEMENT: &str = "assembly";

// ═══════════════════════════════════════════════════════════════════════════════
//  BinPathType
// ═══════════════════════════════════════════════════════════════════════════════

/// How the private bin path of a configuration is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinPathType {
    /// Computed from the directories of the configuration's assemblies.
    Auto,
    /// The stored `binpath` value, used verbatim.
    Manual,
    /// No private bin path, whatever is stored.
    None,
}

impl BinPathType {
    pub const ALL: [BinPathType; 3] = [BinPathType::Auto, BinPathType::Manual, BinPathType::None];

    pub fn as_str(self) -> &'static str {
        match self {
            BinPathType::Auto => "Auto",
            BinPathType::Manual => "Manual",
            BinPathType::None => "None",
        }
    }
}

impl fmt::Display for BinPathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BinPathType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        BinPathType::ALL
            .into_iter()
            .find(|t| s.trim().eq_ignore_ascii_case(t.as_str()))
            .ok_or_else(|| format!("unknown bin path type '{s}'"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Shared tree helpers
// ═══════════════════════════════════════════════════════════════════════════════

fn config_nodes(doc: &ProjectDocument) -> Vec<NodeId> {
    doc.tree()
        .map(|t| t.children_named(t.root(), CONFIG_ELEMENT).collect())
        .unwrap_or_default()
}

fn config_named(doc: &ProjectDocument, name: &str) -> Option<NodeId> {
    let tree = doc.tree()?;
    tree.children_named(tree.root(), CONFIG_ELEMENT)
        .find(|&n| tree.attribute(n, "name") == Some(name))
}

fn assembly_nodes(doc: &ProjectDocument, config: NodeId) -> Vec<NodeId> {
    doc.tree()
        .map(|t| t.children_named(config, ASSEMBLY_ELEMENT).collect())
        .unwrap_or_default()
}

/// Rewrite or drop the stored active configuration name after the
/// configuration called `old` was renamed to `new` (or removed, for `None`).
fn retarget_active_config(tree: &mut XmlTree, old: &str, new: Option<&str>) {
    let Some(settings) = settings_node(tree) else {
        return;
    };
    if tree.attribute(settings, ACTIVE_CONFIG_ATTR) != Some(old) {
        return;
    }
    let root = tree.root();
    if tree.children_named(root, CONFIG_ELEMENT).any(|n| tree.attribute(n, "name") == Some(old)) {
        return;
    }
    match new {
        Some(new) => tree.set_attribute(settings, ACTIVE_CONFIG_ATTR, new),
        None => {
            tree.remove_attribute(settings, ACTIVE_CONFIG_ATTR);
        }
    }
}

fn out_of_range(index: usize, len: usize) -> ProjectError {
    ProjectError::IndexOutOfRange { index, len }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  ConfigList
// ═══════════════════════════════════════════════════════════════════════════════

/// The configurations of a project, in document order.
#[derive(Debug, Clone, Copy)]
pub struct ConfigList<'a> {
    doc: &'a ProjectDocument,
}

impl<'a> ConfigList<'a> {
    pub fn len(&self) -> usize {
        config_nodes(self.doc).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Config<'a>> {
        let node = *config_nodes(self.doc).get(index)?;
        Some(Config { doc: self.doc, node })
    }

    /// The first configuration with exactly this name.
    pub fn by_name(&self, name: &str) -> Option<Config<'a>> {
        config_named(self.doc, name).map(|node| Config { doc: self.doc, node })
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.iter().position(|c| c.name() == Some(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        config_named(self.doc, name).is_some()
    }

    /// Names in document order.  Configurations without a name are skipped.
    pub fn names(&self) -> Vec<&'a str> {
        self.iter().filter_map(|c| c.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Config<'a>> + use<'a> {
        let doc = self.doc;
        config_nodes(doc).into_iter().map(move |node| Config { doc, node })
    }
}

/// Mutable access to the configuration list.
#[derive(Debug)]
pub struct ConfigListMut<'a> {
    doc: &'a mut ProjectDocument,
}

impl<'a> ConfigListMut<'a> {
    pub fn as_list(&self) -> ConfigList<'_> {
        ConfigList { doc: &*self.doc }
    }

    fn config_mut(&mut self, node: NodeId) -> ConfigMut<'_> {
        ConfigMut { doc: &mut *self.doc, node }
    }

    /// Append a new, empty configuration.  Names are not checked for
    /// uniqueness here; see [`crate::validate::validate_config_name`].
    pub fn add(&mut self, name: &str) -> Result<ConfigMut<'_>> {
        let node = self.doc.modify(|tree| {
            let root = tree.root();
            let node = tree.insert_element(root, CONFIG_ELEMENT, usize::MAX);
            tree.set_attribute(node, "name", name);
            node
        })?;
        debug!(name, "added configuration");
        Ok(self.config_mut(node))
    }

    /// Append a configuration copying every setting and assembly of the
    /// configuration named `source`.  `Ok(None)` if there is no such source.
    pub fn add_copy(&mut self, name: &str, source: &str) -> Result<Option<ConfigMut<'_>>> {
        self.doc.tree().ok_or_else(|| invalid(&*self.doc))?;
        let Some(source_node) = config_named(self.doc, source) else {
            return Ok(None);
        };
        let node = self.doc.modify(|tree| {
            let root = tree.root();
            let copy = tree.copy_element(source_node, root);
            tree.set_attribute(copy, "name", name);
            copy
        })?;
        debug!(name, source, "copied configuration");
        Ok(Some(self.config_mut(node)))
    }

    /// Remove the configuration at `index`.  If it was the stored active
    /// configuration, the stored name is cleared in the same mutation.
    pub fn remove_at(&mut self, index: usize) -> Result<()> {
        self.doc.tree().ok_or_else(|| invalid(&*self.doc))?;
        let nodes = config_nodes(self.doc);
        let node = *nodes.get(index).ok_or_else(|| out_of_range(index, nodes.len()))?;

        self.doc.modify(|tree| {
            let name = tree.attribute(node, "name").map(str::to_string);
            tree.remove(node);
            if let Some(name) = name {
                retarget_active_config(tree, &name, None);
            }
        })?;
        debug!(index, "removed configuration");
        Ok(())
    }

    /// Remove the first configuration with this name.  Returns whether one
    /// was found.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        match self.as_list().index_of(name) {
            Some(index) => self.remove_at(index).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<ConfigMut<'_>> {
        let node = *config_nodes(self.doc).get(index)?;
        Some(self.config_mut(node))
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<ConfigMut<'_>> {
        let node = config_named(self.doc, name)?;
        Some(self.config_mut(node))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Config
// ═══════════════════════════════════════════════════════════════════════════════

/// One named configuration.
#[derive(Debug, Clone, Copy)]
pub struct Config<'a> {
    doc: &'a ProjectDocument,
    node: NodeId,
}

impl<'a> Config<'a> {
    fn attribute(&self, name: &str) -> Option<&'a str> {
        self.doc.tree()?.attribute(self.node, name)
    }

    pub fn name(&self) -> Option<&'a str> {
        self.attribute("name")
    }

    /// The configuration's own base directory, `/`-separated.
    pub fn base_path(&self) -> Option<String> {
        self.attribute("appbase").map(path_utils::standardize_separators)
    }

    pub fn configuration_file(&self) -> Option<String> {
        self.attribute("configfile").map(path_utils::standardize_separators)
    }

    /// `;`- or `:`-separated probing directories, `/`-separated.
    pub fn private_bin_path(&self) -> Option<String> {
        self.attribute("binpath").map(path_utils::standardize_separators)
    }

    /// Stored bin path type.  Without one, `Manual` if a private bin path is
    /// stored and `Auto` otherwise.
    pub fn bin_path_type_parsed(&self) -> Parsed<BinPathType> {
        let default = match self.attribute("binpath") {
            Some(_) => BinPathType::Manual,
            None => BinPathType::Auto,
        };
        parse_enum_or_default("binpathtype", self.attribute("binpathtype"), default)
    }

    pub fn bin_path_type(&self) -> BinPathType {
        self.bin_path_type_parsed().value
    }

    pub fn runtime_framework_parsed(&self) -> Parsed<RuntimeFramework> {
        parse_or_default(
            "runtimeFramework",
            self.attribute("runtimeFramework"),
            RuntimeFramework::ANY,
            parse_runtime_framework,
        )
    }

    /// The target runtime, [`RuntimeFramework::ANY`] when unset.
    pub fn runtime_framework(&self) -> RuntimeFramework {
        self.runtime_framework_parsed().value
    }

    pub fn assemblies(&self) -> AssemblyList<'a> {
        AssemblyList { doc: self.doc, config: self.node }
    }

    /// The configuration base resolved against the project's effective
    /// base, or the project's effective base when the configuration has
    /// none.
    pub fn effective_base_path(&self) -> Option<String> {
        let project_base = self.doc.settings().effective_base_path();
        match (self.base_path(), project_base) {
            (Some(base), Some(project)) => Some(path_utils::combine(&project, &base)),
            (base, project) => base.or(project),
        }
    }

    /// The configuration base as shown to a user: relative to the project's
    /// effective base when both are rooted and share a root, otherwise as
    /// stored.
    pub fn relative_base_path(&self) -> Option<String> {
        let base = self.base_path()?;
        if !path_utils::is_rooted(&base) {
            return Some(base);
        }
        let relative = self
            .doc
            .settings()
            .effective_base_path()
            .and_then(|project| path_utils::relative_path(&project, &base));
        Some(relative.unwrap_or(base))
    }

    /// The private bin path that applies under the current bin path type.
    ///
    /// `Auto` derives it from the distinct directories of the assemblies,
    /// taken relative to [`effective_base_path`](Self::effective_base_path).
    pub fn effective_private_bin_path(&self) -> Option<String> {
        match self.bin_path_type() {
            BinPathType::Manual => self.private_bin_path(),
            BinPathType::None => None,
            BinPathType::Auto => {
                let base = self.effective_base_path().unwrap_or_default();
                let mut dirs: Vec<String> = Vec::new();
                for assembly in self.assemblies().iter() {
                    let Some(relative) = path_utils::relative_path(&base, assembly) else {
                        continue;
                    };
                    let dir = path_utils::directory_name(&relative);
                    if !dir.is_empty() && !dir.starts_with("..") && !dirs.iter().any(|d| d == dir) {
                        dirs.push(dir.to_string());
                    }
                }
                (!dirs.is_empty()).then(|| dirs.join(";"))
            }
        }
    }
}

/// Mutable access to one configuration.
#[derive(Debug)]
pub struct ConfigMut<'a> {
    doc: &'a mut ProjectDocument,
    node: NodeId,
}

impl<'a> ConfigMut<'a> {
    pub fn as_config(&self) -> Config<'_> {
        Config { doc: &*self.doc, node: self.node }
    }

    fn set(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        self.doc.set_attribute(self.node, name, value)
    }

    /// Rename the configuration.  If it was the stored active configuration,
    /// the stored name follows in the same mutation.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        let tree = self.doc.tree().ok_or_else(|| invalid(&*self.doc))?;
        let old = tree.attribute(self.node, "name").map(str::to_string);
        if old.as_deref() == Some(name) {
            return Ok(());
        }
        let node = self.node;
        self.doc.modify(|tree| {
            tree.set_attribute(node, "name", name);
            if let Some(old) = &old {
                retarget_active_config(tree, old, Some(name));
            }
        })?;
        debug!(old = ?old, new = name, "renamed configuration");
        Ok(())
    }

    pub fn set_base_path(&mut self, path: Option<&str>) -> Result<()> {
        let path = path.map(checked_path).transpose()?;
        self.set("appbase", path.as_deref())
    }

    pub fn set_configuration_file(&mut self, file: Option<&str>) -> Result<()> {
        let file = file.map(checked_path).transpose()?;
        self.set("configfile", file.as_deref())
    }

    pub fn set_private_bin_path(&mut self, bin_path: Option<&str>) -> Result<()> {
        let bin_path = bin_path.map(checked_path).transpose()?;
        self.set("binpath", bin_path.as_deref())
    }

    pub fn set_bin_path_type(&mut self, bin_path_type: BinPathType) -> Result<()> {
        self.set("binpathtype", Some(bin_path_type.as_str()))
    }

    /// Set the target runtime, or remove the constraint with `None`.
    pub fn set_runtime_framework(&mut self, framework: Option<RuntimeFramework>) -> Result<()> {
        let value = framework.map(|f| f.to_string());
        self.set("runtimeFramework", value.as_deref())
    }

    pub fn assemblies_mut(&mut self) -> AssemblyListMut<'_> {
        AssemblyListMut { doc: &mut *self.doc, config: self.node }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  AssemblyList
// ═══════════════════════════════════════════════════════════════════════════════

/// The ordered assembly paths of one configuration.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyList<'a> {
    doc: &'a ProjectDocument,
    config: NodeId,
}

impl<'a> AssemblyList<'a> {
    fn path_of(&self, node: NodeId) -> &'a str {
        self.doc
            .tree()
            .and_then(|t| t.attribute(node, "path"))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        assembly_nodes(self.doc, self.config).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&'a str> {
        let node = *assembly_nodes(self.doc, self.config).get(index)?;
        Some(self.path_of(node))
    }

    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.iter().position(|p| p == path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index_of(path).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        let list = *self;
        assembly_nodes(self.doc, self.config)
            .into_iter()
            .map(move |node| list.path_of(node))
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }
}

/// Mutable access to one configuration's assemblies.
#[derive(Debug)]
pub struct AssemblyListMut<'a> {
    doc: &'a mut ProjectDocument,
    config: NodeId,
}

impl<'a> AssemblyListMut<'a> {
    pub fn as_list(&self) -> AssemblyList<'_> {
        AssemblyList { doc: &*self.doc, config: self.config }
    }

    fn node_at(&self, index: usize) -> Result<NodeId> {
        self.doc.tree().ok_or_else(|| invalid(&*self.doc))?;
        let nodes = assembly_nodes(self.doc, self.config);
        nodes.get(index).copied().ok_or_else(|| out_of_range(index, nodes.len()))
    }

    /// Append a path.  Separators are stored as `/`.
    pub fn add(&mut self, path: &str) -> Result<()> {
        let path = checked_path(path)?;
        let config = self.config;
        self.doc.modify(|tree| {
            let node = tree.append_element(config, ASSEMBLY_ELEMENT);
            tree.set_attribute(node, "path", &path);
        })
    }

    /// Insert a path so it lands at `index`, shifting later entries right.
    /// `index == len()` appends.
    pub fn insert(&mut self, index: usize, path: &str) -> Result<()> {
        let path = checked_path(path)?;
        self.doc.tree().ok_or_else(|| invalid(&*self.doc))?;
        let len = self.as_list().len();
        if index > len {
            return Err(out_of_range(index, len));
        }
        let config = self.config;
        self.doc.modify(|tree| {
            let node = tree.insert_element(config, ASSEMBLY_ELEMENT, index);
            tree.set_attribute(node, "path", &path);
        })
    }

    pub fn remove_at(&mut self, index: usize) -> Result<()> {
        let node = self.node_at(index)?;
        self.doc.modify(|tree| tree.remove(node))
    }

    /// Replace the path at `index` without moving it.
    pub fn set(&mut self, index: usize, path: &str) -> Result<()> {
        let path = checked_path(path)?;
        let node = self.node_at(index)?;
        self.doc.set_attribute(node, "path", Some(path.as_str()))
    }

    /// Remove the first entry equal to `path`.  Returns whether one was
    /// found.
    pub fn remove(&mut self, path: &str) -> Result<bool> {
        let list = self.as_list();
        let index = list
            .index_of(path)
            .or_else(|| list.index_of(&path_utils::standardize_separators(path)));
        match index {
            Some(index) => self.remove_at(index).map(|()| true),
            None => Ok(false),
        }
    }

    /// Remove every assembly.  The configuration's own settings are kept.
    pub fn clear(&mut self) -> Result<()> {
        self.doc.tree().ok_or_else(|| invalid(&*self.doc))?;
        let nodes = assembly_nodes(self.doc, self.config);
        if nodes.is_empty() {
            return Ok(());
        }
        self.doc.modify(|tree| {
            for node in nodes {
                tree.remove(node);
            }
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Document entry points
// ═══════════════════════════════════════════════════════════════════════════════

impl ProjectDocument {
    /// Live view of the configurations.  Empty when the document is invalid.
    pub fn configs(&self) -> ConfigList<'_> {
        ConfigList { doc: self }
    }

    pub fn configs_mut(&mut self) -> ConfigListMut<'_> {
        ConfigListMut { doc: self }
    }

    /// Shorthand for `configs_mut().by_name_mut(name)`.
    pub fn config_mut(&mut self, name: &str) -> Option<ConfigMut<'_>> {
        let node = config_named(self, name)?;
        Some(ConfigMut { doc: self, node })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentEvent;
    use crate::document::tests::{NORMAL_PROJECT, record};
    use crate::runtime::{ClrVersion, RuntimeType};

    const EMPTY_CONFIGS: &str = r#"<NUnitProject>
  <Config name="Debug" />
  <Config name="Release" />
</NUnitProject>"#;

    const MANUAL_BIN_PATH_PROJECT: &str = r#"<NUnitProject>
  <Config name="Debug" binpath="bin_path_value" />
</NUnitProject>"#;

    const COMPLEX_SETTINGS_PROJECT: &str = r#"<NUnitProject>
  <Settings appbase="bin" processModel="Separate" domainUsage="Multiple" />
  <Config name="Debug" appbase="debug" runtimeFramework="v2.0">
    <assembly path="assembly1.dll" />
    <assembly path="assembly2.dll" />
  </Config>
  <Config name="Release" appbase="release" runtimeFramework="v4.0">
    <assembly path="assembly1.dll" />
    <assembly path="assembly2.dll" />
  </Config>
</NUnitProject>"#;

    fn load(text: &str) -> ProjectDocument {
        let mut doc = ProjectDocument::new();
        doc.load_xml(text);
        doc
    }

    // ── Loading ──────────────────────────────────────────────────────────

    #[test]
    fn load_empty_project() {
        let doc = load("<NUnitProject />");
        assert_eq!(doc.configs().len(), 0);
        assert!(doc.configs().is_empty());
    }

    #[test]
    fn load_empty_configs() {
        let doc = load(EMPTY_CONFIGS);
        let configs = doc.configs();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs.get(0).unwrap().name(), Some("Debug"));
        assert_eq!(configs.get(1).unwrap().name(), Some("Release"));
        assert!(configs.get(2).is_none());
        assert_eq!(configs.names(), ["Debug", "Release"]);
    }

    #[test]
    fn load_normal_project() {
        let doc = load(NORMAL_PROJECT);
        assert_eq!(doc.configs().len(), 2);
        for config in doc.configs().iter() {
            assert_eq!(config.assemblies().to_vec(), ["assembly1.dll", "assembly2.dll"]);
        }
    }

    #[test]
    fn load_project_with_manual_bin_path() {
        let doc = load(MANUAL_BIN_PATH_PROJECT);
        let debug = doc.configs().by_name("Debug").unwrap();
        assert_eq!(debug.private_bin_path().as_deref(), Some("bin_path_value"));
        assert_eq!(debug.bin_path_type(), BinPathType::Manual);
    }

    #[test]
    fn load_project_with_complex_settings() {
        let doc = load(COMPLEX_SETTINGS_PROJECT);
        let configs = doc.configs();

        let debug = configs.get(0).unwrap();
        assert_eq!(debug.base_path().as_deref(), Some("debug"));
        assert_eq!(debug.runtime_framework().to_string(), "v2.0");
        assert_eq!(debug.runtime_framework().version.unwrap().to_string_n(2), "2.0");
        assert_eq!(debug.assemblies().len(), 2);

        let release = configs.get(1).unwrap();
        assert_eq!(release.base_path().as_deref(), Some("release"));
        assert_eq!(release.runtime_framework().to_string(), "v4.0");
        assert_eq!(release.assemblies().get(1), Some("assembly2.dll"));
    }

    #[test]
    fn invalid_document_has_no_configs() {
        let doc = load("<NUnitProject><Config name=\"Debug\">");
        assert!(doc.configs().is_empty());
        assert!(doc.configs().by_name("Debug").is_none());
    }

    #[test]
    fn defaults_for_unset_attributes() {
        let doc = load(EMPTY_CONFIGS);
        let debug = doc.configs().get(0).unwrap();
        assert_eq!(debug.bin_path_type(), BinPathType::Auto);
        assert_eq!(debug.runtime_framework(), RuntimeFramework::ANY);
        assert_eq!(debug.base_path(), None);
        assert_eq!(debug.configuration_file(), None);
    }

    #[test]
    fn loaded_configuration_file_is_standardized() {
        let doc = load(r#"<NUnitProject><Config name="A" configfile="conf\x.config" /></NUnitProject>"#);
        let config = doc.configs().get(0).unwrap();
        assert_eq!(config.configuration_file().as_deref(), Some("conf/x.config"));
    }

    #[test]
    fn edits_keep_comments_declaration_and_namespaces() {
        let mut doc = load(
            r#"<?xml version="1.0" encoding="utf-8"?><NUnitProject xmlns:x="urn:x"><!-- nightly build only --><Config name="Debug" x:note="keep" /></NUnitProject>"#,
        );
        doc.configs_mut().add("Release").unwrap();

        assert_eq!(
            doc.xml_text(),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <NUnitProject xmlns:x=\"urn:x\">\n  <!-- nightly build only -->\n  \
             <Config name=\"Debug\" x:note=\"keep\" />\n  <Config name=\"Release\" />\n</NUnitProject>"
        );
        assert_eq!(doc.configs().names(), ["Debug", "Release"]);
    }

    #[test]
    fn stored_bin_path_type_wins_over_default() {
        let doc = load(r#"<NUnitProject><Config name="A" binpath="x" binpathtype="none" /></NUnitProject>"#);
        let config = doc.configs().get(0).unwrap();
        assert_eq!(config.bin_path_type(), BinPathType::None);
        assert_eq!(config.effective_private_bin_path(), None);
    }

    #[test]
    fn bad_runtime_framework_falls_back_to_any() {
        let doc = load(r#"<NUnitProject><Config name="A" runtimeFramework="java-8" /></NUnitProject>"#);
        let parsed = doc.configs().get(0).unwrap().runtime_framework_parsed();
        assert_eq!(parsed.value, RuntimeFramework::ANY);
        assert!(parsed.diagnostic.is_some());
    }

    #[test]
    fn backslashes_in_loaded_paths_read_as_slashes() {
        let doc = load(r#"<NUnitProject><Config name="A" appbase="bin\debug" binpath="a\b;c" /></NUnitProject>"#);
        let config = doc.configs().get(0).unwrap();
        assert_eq!(config.base_path().as_deref(), Some("bin/debug"));
        assert_eq!(config.private_bin_path().as_deref(), Some("a/b;c"));
    }

    // ── Renaming ─────────────────────────────────────────────────────────

    #[test]
    fn rename_config_makes_project_dirty_and_notifies_once() {
        let mut doc = load(NORMAL_PROJECT);
        let events = record(&mut doc);
        doc.configs_mut().get_mut(0).unwrap().set_name("New").unwrap();

        assert!(doc.has_unsaved_changes());
        assert_eq!(*events.borrow(), [DocumentEvent::Changed]);
        assert_eq!(doc.configs().names(), ["New", "Release"]);
    }

    #[test]
    fn renaming_active_config_changes_active_config_name() {
        let mut doc = load(NORMAL_PROJECT);
        doc.configs_mut().get_mut(0).unwrap().set_name("New").unwrap();
        assert_eq!(doc.settings().active_config_name(), Some("New"));
    }

    #[test]
    fn renaming_stored_active_config_updates_it_in_one_change() {
        let mut doc = load(NORMAL_PROJECT);
        doc.settings_mut().set_active_config_name(Some("Release")).unwrap();
        let events = record(&mut doc);
        doc.config_mut("Release").unwrap().set_name("Shipping").unwrap();

        assert_eq!(doc.settings().stored_active_config_name(), Some("Shipping"));
        assert_eq!(doc.settings().active_config_name(), Some("Shipping"));
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn renaming_to_same_name_is_not_a_change() {
        let mut doc = load(NORMAL_PROJECT);
        let events = record(&mut doc);
        doc.config_mut("Debug").unwrap().set_name("Debug").unwrap();
        assert!(events.borrow().is_empty());
    }

    // ── Removing ─────────────────────────────────────────────────────────

    #[test]
    fn remove_config_makes_project_dirty_and_notifies_once() {
        let mut doc = load(NORMAL_PROJECT);
        let events = record(&mut doc);
        assert!(doc.configs_mut().remove("Debug").unwrap());

        assert!(doc.has_unsaved_changes());
        assert_eq!(*events.borrow(), [DocumentEvent::Changed]);
        assert_eq!(doc.configs().names(), ["Release"]);
    }

    #[test]
    fn removing_active_config_changes_active_config_name() {
        let mut doc = load(NORMAL_PROJECT);
        doc.settings_mut().set_active_config_name(Some("Debug")).unwrap();
        doc.configs_mut().remove("Debug").unwrap();

        assert_eq!(doc.settings().stored_active_config_name(), None);
        assert_eq!(doc.settings().active_config_name(), Some("Release"));

        doc.configs_mut().remove_at(0).unwrap();
        assert_eq!(doc.settings().active_config_name(), None);
    }

    #[test]
    fn removing_other_config_keeps_active_config() {
        let mut doc = load(NORMAL_PROJECT);
        doc.settings_mut().set_active_config_name(Some("Release")).unwrap();
        doc.configs_mut().remove("Debug").unwrap();
        assert_eq!(doc.settings().stored_active_config_name(), Some("Release"));
    }

    #[test]
    fn removing_missing_config_is_not_a_change() {
        let mut doc = load(NORMAL_PROJECT);
        let events = record(&mut doc);
        assert!(!doc.configs_mut().remove("Nope").unwrap());
        assert!(matches!(
            doc.configs_mut().remove_at(5),
            Err(ProjectError::IndexOutOfRange { index: 5, len: 2 })
        ));
        assert!(events.borrow().is_empty());
        assert!(!doc.has_unsaved_changes());
    }

    // ── Adding ───────────────────────────────────────────────────────────

    #[test]
    fn add_appends_in_document_order() {
        let mut doc = load(NORMAL_PROJECT);
        let events = record(&mut doc);
        doc.configs_mut().add("Profile").unwrap();

        assert_eq!(doc.configs().names(), ["Debug", "Release", "Profile"]);
        assert_eq!(doc.configs().index_of("Profile"), Some(2));
        assert_eq!(*events.borrow(), [DocumentEvent::Changed]);
    }

    #[test]
    fn add_does_not_reject_duplicates() {
        let mut doc = load(NORMAL_PROJECT);
        doc.configs_mut().add("Debug").unwrap();
        assert_eq!(doc.configs().len(), 3);
        assert_eq!(doc.configs().index_of("Debug"), Some(0));
    }

    #[test]
    fn added_config_can_be_edited_in_place() {
        let mut doc = load("<NUnitProject />");
        {
            let mut configs = doc.configs_mut();
            let mut config = configs.add("Debug").unwrap();
            config.set_base_path(Some(r"bin\Debug")).unwrap();
            config.assemblies_mut().add("tests.dll").unwrap();
        }
        let debug = doc.configs().by_name("Debug").unwrap();
        assert_eq!(debug.base_path().as_deref(), Some("bin/Debug"));
        assert_eq!(debug.assemblies().to_vec(), ["tests.dll"]);
    }

    #[test]
    fn add_copy_duplicates_settings_and_assemblies() {
        let mut doc = load(COMPLEX_SETTINGS_PROJECT);
        assert!(doc.configs_mut().add_copy("Profile", "Debug").unwrap().is_some());
        assert!(doc.configs_mut().add_copy("Other", "Nope").unwrap().is_none());

        let profile = doc.configs().by_name("Profile").unwrap();
        assert_eq!(profile.base_path().as_deref(), Some("debug"));
        assert_eq!(profile.runtime_framework().to_string(), "v2.0");
        assert_eq!(profile.assemblies().to_vec(), ["assembly1.dll", "assembly2.dll"]);

        doc.config_mut("Profile").unwrap().assemblies_mut().clear().unwrap();
        assert_eq!(doc.configs().by_name("Debug").unwrap().assemblies().len(), 2);
    }

    #[test]
    fn add_on_invalid_document_fails() {
        let mut doc = load("<NUnitProject>");
        assert!(matches!(doc.configs_mut().add("Debug"), Err(ProjectError::InvalidDocument)));
        assert!(matches!(doc.configs_mut().add_copy("A", "B"), Err(ProjectError::InvalidDocument)));
    }

    // ── Config setters ───────────────────────────────────────────────────

    #[test]
    fn setters_store_and_clear_attributes() {
        let mut doc = load(EMPTY_CONFIGS);
        let mut config = doc.config_mut("Debug").unwrap();
        config.set_configuration_file(Some("tests.config")).unwrap();
        config.set_private_bin_path(Some(r"lib;lib\extra")).unwrap();
        config.set_bin_path_type(BinPathType::Manual).unwrap();
        config
            .set_runtime_framework(Some(RuntimeFramework::new(RuntimeType::Net, Some(ClrVersion::new(4, 0)))))
            .unwrap();

        let read = config.as_config();
        assert_eq!(read.configuration_file().as_deref(), Some("tests.config"));
        assert_eq!(read.private_bin_path().as_deref(), Some("lib;lib/extra"));
        assert_eq!(read.bin_path_type(), BinPathType::Manual);
        assert_eq!(read.runtime_framework().to_string(), "net-4.0");

        config.set_runtime_framework(None).unwrap();
        config.set_configuration_file(None).unwrap();
        assert_eq!(config.as_config().runtime_framework(), RuntimeFramework::ANY);
        assert_eq!(config.as_config().configuration_file(), None);
    }

    #[test]
    fn invalid_path_is_rejected_without_change() {
        let mut doc = load(EMPTY_CONFIGS);
        let events = record(&mut doc);
        let err = doc.config_mut("Debug").unwrap().set_base_path(Some("bin\0")).unwrap_err();
        assert!(matches!(err, ProjectError::InvalidPath { .. }));
        assert!(events.borrow().is_empty());
    }

    // ── Assemblies ───────────────────────────────────────────────────────

    #[test]
    fn can_add_assemblies() {
        let mut doc = load(EMPTY_CONFIGS);
        doc.config_mut("Debug").unwrap().assemblies_mut().add(r"C:\bin\debug\assembly1.dll").unwrap();
        doc.config_mut("Debug").unwrap().assemblies_mut().add(r"C:\bin\debug\assembly2.dll").unwrap();
        doc.config_mut("Release").unwrap().assemblies_mut().add(r"C:\bin\debug\assembly3.dll").unwrap();

        assert_eq!(doc.configs().len(), 2);
        let debug = doc.configs().by_name("Debug").unwrap().assemblies();
        assert_eq!(debug.len(), 2);
        assert_eq!(debug.get(0), Some("C:/bin/debug/assembly1.dll"));
        assert_eq!(doc.configs().by_name("Release").unwrap().assemblies().len(), 1);
    }

    #[test]
    fn adding_assembly_fires_one_changed_event() {
        let mut doc = load(EMPTY_CONFIGS);
        let events = record(&mut doc);
        doc.config_mut("Debug").unwrap().assemblies_mut().add("assembly1.dll").unwrap();
        assert!(doc.has_unsaved_changes());
        assert_eq!(*events.borrow(), [DocumentEvent::Changed]);
    }

    #[test]
    fn removing_assembly_fires_one_changed_event() {
        let mut doc = load(NORMAL_PROJECT);
        let events = record(&mut doc);
        assert!(doc.config_mut("Debug").unwrap().assemblies_mut().remove("assembly1.dll").unwrap());
        assert!(!doc.config_mut("Debug").unwrap().assemblies_mut().remove("assembly1.dll").unwrap());

        assert_eq!(*events.borrow(), [DocumentEvent::Changed]);
        assert_eq!(doc.configs().by_name("Debug").unwrap().assemblies().to_vec(), ["assembly2.dll"]);
    }

    #[test]
    fn insert_set_and_remove_at_keep_order() {
        let mut doc = load(NORMAL_PROJECT);
        let mut config = doc.config_mut("Debug").unwrap();
        let mut assemblies = config.assemblies_mut();

        assemblies.insert(0, "first.dll").unwrap();
        assemblies.insert(3, "last.dll").unwrap();
        assert_eq!(
            assemblies.as_list().to_vec(),
            ["first.dll", "assembly1.dll", "assembly2.dll", "last.dll"]
        );

        assemblies.set(1, "replaced.dll").unwrap();
        assemblies.remove_at(2).unwrap();
        assert_eq!(assemblies.as_list().to_vec(), ["first.dll", "replaced.dll", "last.dll"]);
        assert_eq!(assemblies.as_list().index_of("last.dll"), Some(2));
        assert!(assemblies.as_list().contains("replaced.dll"));

        assert!(matches!(assemblies.insert(9, "x.dll"), Err(ProjectError::IndexOutOfRange { .. })));
        assert!(matches!(assemblies.set(3, "x.dll"), Err(ProjectError::IndexOutOfRange { .. })));
        assert!(matches!(assemblies.remove_at(3), Err(ProjectError::IndexOutOfRange { .. })));
    }

    #[test]
    fn clear_keeps_config_attributes() {
        let mut doc = load(COMPLEX_SETTINGS_PROJECT);
        let events = record(&mut doc);
        doc.config_mut("Debug").unwrap().assemblies_mut().clear().unwrap();
        doc.config_mut("Debug").unwrap().assemblies_mut().clear().unwrap();

        let debug = doc.configs().by_name("Debug").unwrap();
        assert!(debug.assemblies().is_empty());
        assert_eq!(debug.base_path().as_deref(), Some("debug"));
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn views_are_live() {
        let mut doc = load(NORMAL_PROJECT);
        doc.config_mut("Release").unwrap().assemblies_mut().add("assembly3.dll").unwrap();
        doc.configs_mut().remove("Debug").unwrap();

        let configs = doc.configs();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs.get(0).unwrap().assemblies().len(), 3);
    }

    #[test]
    fn batched_edits_send_one_change() {
        let mut doc = load(EMPTY_CONFIGS);
        let events = record(&mut doc);
        doc.batch(|doc| -> Result<()> {
            let mut debug = doc.config_mut("Debug").unwrap();
            debug.assemblies_mut().add("a.dll")?;
            debug.assemblies_mut().add("b.dll")?;
            doc.configs_mut().remove("Release")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(*events.borrow(), [DocumentEvent::Changed]);
    }

    #[test]
    fn can_save_and_reload_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MyProject.nunit");

        let mut doc = load("<NUnitProject />");
        for (name, assemblies) in [("Debug", ["b.dll", "a.dll"]), ("Release", ["c.dll", "b.dll"])] {
            let mut configs = doc.configs_mut();
            let mut config = configs.add(name).unwrap();
            for assembly in assemblies {
                config.assemblies_mut().add(assembly).unwrap();
            }
        }
        doc.save_as(&path).unwrap();

        let mut reloaded = ProjectDocument::new();
        reloaded.load(&path).unwrap();
        assert_eq!(reloaded.configs().names(), ["Debug", "Release"]);
        assert_eq!(reloaded.configs().get(0).unwrap().assemblies().to_vec(), ["b.dll", "a.dll"]);
        assert_eq!(reloaded.configs().get(1).unwrap().assemblies().to_vec(), ["c.dll", "b.dll"]);
        assert!(!reloaded.has_unsaved_changes());
    }

    // ── Derived paths ────────────────────────────────────────────────────

    #[test]
    fn effective_and_relative_base_paths() {
        let mut doc = ProjectDocument::builder()
            .path("/projects/MyProject.nunit")
            .load_xml(COMPLEX_SETTINGS_PROJECT);
        let debug = doc.configs().by_name("Debug").unwrap();
        assert_eq!(debug.effective_base_path().as_deref(), Some("/projects/bin/debug"));
        assert_eq!(debug.relative_base_path().as_deref(), Some("debug"));

        doc.config_mut("Debug").unwrap().set_base_path(Some("/projects/bin/x64")).unwrap();
        let debug = doc.configs().by_name("Debug").unwrap();
        assert_eq!(debug.effective_base_path().as_deref(), Some("/projects/bin/x64"));
        assert_eq!(debug.relative_base_path().as_deref(), Some("x64"));
    }

    #[test]
    fn config_without_base_uses_project_base() {
        let doc = ProjectDocument::builder()
            .path("/projects/MyProject.nunit")
            .load_xml(EMPTY_CONFIGS);
        let debug = doc.configs().get(0).unwrap();
        assert_eq!(debug.effective_base_path().as_deref(), Some("/projects"));
        assert_eq!(debug.relative_base_path(), None);
    }

    #[test]
    fn auto_private_bin_path_lists_assembly_directories() {
        let doc = ProjectDocument::builder().path("/projects/MyProject.nunit").load_xml(
            r#"<NUnitProject>
  <Config name="Debug">
    <assembly path="/projects/tests.dll" />
    <assembly path="/projects/lib/a.dll" />
    <assembly path="/projects/lib/b.dll" />
    <assembly path="plugins/c.dll" />
    <assembly path="/other/d.dll" />
  </Config>
</NUnitProject>"#,
        );
        let debug = doc.configs().get(0).unwrap();
        assert_eq!(debug.bin_path_type(), BinPathType::Auto);
        assert_eq!(debug.effective_private_bin_path().as_deref(), Some("lib;plugins"));
    }
}
