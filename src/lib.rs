pub mod attribute;
pub mod config;
pub mod document;
pub mod error;
pub mod path_utils;
pub mod runtime;
pub mod settings;
pub mod validate;
pub mod xml;

pub use config::{AssemblyList, AssemblyListMut, BinPathType, Config, ConfigList, ConfigListMut, ConfigMut};
pub use document::{DocumentEvent, ProjectDocument, ProjectDocumentBuilder, SubscriptionId, is_project_file};
pub use error::{ParseError, ProjectError, Result, ValidationError};
pub use runtime::{ClrVersion, RuntimeFramework, RuntimeType};
pub use settings::{DomainUsage, ProcessModel, ProjectSettings, ProjectSettingsMut};
