//! Checks a front end runs on user input before handing it to the model.
//!
//! The model stores what it is given: configuration names are not checked
//! for uniqueness and path lists are not checked for absolute components.
//! These functions are the single place those rules live.

use crate::error::ValidationError;
use crate::path_utils::{self, PATH_LIST_SEPARATORS};

type Result<T> = std::result::Result<T, ValidationError>;

/// A configuration name must be non-empty and not already in `existing`.
/// Comparison is case-sensitive.
///
/// ```
/// use nunitproj_rs::{ProjectDocument, validate::validate_config_name};
///
/// let doc = ProjectDocument::builder()
///     .load_xml(r#"<NUnitProject><Config name="Debug" /></NUnitProject>"#);
/// assert!(validate_config_name(doc.configs().names(), "Release").is_ok());
/// assert!(validate_config_name(doc.configs().names(), "Debug").is_err());
/// ```
pub fn validate_config_name<'a>(existing: impl IntoIterator<Item = &'a str>, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if existing.into_iter().any(|n| n == name) {
        return Err(ValidationError::DuplicateName(name.to_string()));
    }
    Ok(())
}

/// `path` must be usable as a path at all.  `property` names the setting in
/// the error.
pub fn validate_path(property: &str, path: &str) -> Result<()> {
    match path_utils::invalid_path_reason(path) {
        Some(reason) => Err(ValidationError::InvalidPath {
            property: property.to_string(),
            reason: format!("'{path}' {reason}"),
        }),
        None => Ok(()),
    }
}

/// Every directory in a `;`/`:`-separated private bin path must be a valid,
/// relative path.  Empty entries are ignored.
pub fn validate_private_bin_path(value: &str) -> Result<()> {
    for dir in value.split(PATH_LIST_SEPARATORS).filter(|d| !d.is_empty()) {
        validate_path("PrivateBinPath", dir)?;
        if path_utils::is_rooted(dir) {
            return Err(ValidationError::AbsoluteBinPath(dir.to_string()));
        }
    }
    Ok(())
}

/// A configuration file is named without a directory; it always lives in
/// the application base.
pub fn validate_configuration_file(name: &str) -> Result<()> {
    validate_path("ConfigurationFile", name)?;
    if path_utils::file_name(name) != name {
        return Err(ValidationError::ConfigFileHasDirectory(name.to_string()));
    }
    Ok(())
}
