//! Runtime framework selector stored in a configuration's
//! `runtimeFramework` attribute.
//!
//! Accepted forms (case-insensitive runtime names):
//!
//! ```text
//! framework = runtime ('-' version)?     net, mono-2.0, any
//!           | 'v'? version               v4.0, 2.0.50727
//! version   = int ('.' int){1,3}
//! ```
//!
//! Uses [`chumsky`] for the grammar.

use std::fmt;
use std::str::FromStr;

use chumsky::prelude::*;

// ═══════════════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RuntimeType {
    #[default]
    Any,
    Net,
    Mono,
}

impl RuntimeType {
    pub const ALL: [RuntimeType; 3] = [RuntimeType::Any, RuntimeType::Net, RuntimeType::Mono];

    fn keyword(self) -> &'static str {
        match self {
            RuntimeType::Any => "any",
            RuntimeType::Net => "net",
            RuntimeType::Mono => "mono",
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuntimeType::Any => "Any",
            RuntimeType::Net => "Net",
            RuntimeType::Mono => "Mono",
        };
        f.write_str(name)
    }
}

impl FromStr for RuntimeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuntimeType::ALL
            .into_iter()
            .find(|r| s.eq_ignore_ascii_case(r.keyword()))
            .ok_or_else(|| format!("unknown runtime '{s}'"))
    }
}

/// A CLR version with two to four components (`major.minor[.build[.revision]]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClrVersion {
    pub major: u32,
    pub minor: u32,
    pub build: Option<u32>,
    pub revision: Option<u32>,
}

impl ClrVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor, build: None, revision: None }
    }

    pub const fn with_build(major: u32, minor: u32, build: u32) -> Self {
        Self { major, minor, build: Some(build), revision: None }
    }

    /// Render only the first `fields` components (clamped to those present).
    pub fn to_string_n(&self, fields: usize) -> String {
        let parts = [Some(self.major), Some(self.minor), self.build, self.revision];
        parts
            .iter()
            .take(fields)
            .map_while(|p| *p)
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ClrVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_n(4))
    }
}

/// CLR versions offered when choosing a runtime.
pub const KNOWN_CLR_VERSIONS: [ClrVersion; 4] = [
    ClrVersion::with_build(1, 0, 3705),
    ClrVersion::with_build(1, 1, 4322),
    ClrVersion::with_build(2, 0, 50727),
    ClrVersion::with_build(4, 0, 30319),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RuntimeFramework {
    pub runtime: RuntimeType,
    pub version: Option<ClrVersion>,
}

impl RuntimeFramework {
    /// No constraint on runtime or version.
    pub const ANY: RuntimeFramework = RuntimeFramework { runtime: RuntimeType::Any, version: None };

    pub fn new(runtime: RuntimeType, version: Option<ClrVersion>) -> Self {
        Self { runtime, version }
    }

    pub fn allows_any_version(&self) -> bool {
        self.version.is_none()
    }
}

impl fmt::Display for RuntimeFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.runtime, self.version) {
            (RuntimeType::Any, Some(v)) => write!(f, "v{v}"),
            (runtime, Some(v)) => write!(f, "{}-{v}", runtime.keyword()),
            (runtime, None) => f.write_str(runtime.keyword()),
        }
    }
}

impl FromStr for RuntimeFramework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_runtime_framework(s)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Chumsky parser
// ═══════════════════════════════════════════════════════════════════════════════

fn version_parser<'a>() -> impl Parser<'a, &'a str, ClrVersion, extra::Err<Simple<'a, char>>> {
    // Nine digits always fit in a u32.
    let number = text::int(10)
        .filter(|s: &&str| s.len() <= 9)
        .map(|s: &str| s.parse::<u32>().unwrap_or_default());

    number
        .separated_by(just('.'))
        .at_least(2)
        .at_most(4)
        .collect::<Vec<u32>>()
        .map(|parts| ClrVersion {
            major: parts[0],
            minor: parts[1],
            build: parts.get(2).copied(),
            revision: parts.get(3).copied(),
        })
}

fn framework_parser<'a>() -> impl Parser<'a, &'a str, RuntimeFramework, extra::Err<Simple<'a, char>>> {
    // ── v2.0 / 2.0 ───────────────────────────────────────────────────────
    let bare_version = one_of("vV")
        .or_not()
        .ignore_then(version_parser())
        .map(|v| RuntimeFramework::new(RuntimeType::Any, Some(v)));

    // ── net / mono-4.0 ───────────────────────────────────────────────────
    let runtime = any()
        .filter(|c: &char| c.is_ascii_alphabetic())
        .repeated()
        .at_least(1)
        .to_slice()
        .filter(|s: &&str| s.parse::<RuntimeType>().is_ok())
        .map(|s: &str| s.parse::<RuntimeType>().unwrap_or_default());

    let qualified = runtime
        .then(just('-').ignore_then(version_parser()).or_not())
        .map(|(runtime, version)| RuntimeFramework::new(runtime, version));

    choice((bare_version, qualified)).padded().then_ignore(end())
}

/// Parse a `runtimeFramework` attribute value.
pub fn parse_runtime_framework(input: &str) -> Result<RuntimeFramework, String> {
    framework_parser()
        .parse(input)
        .into_result()
        .map_err(|errs| {
            let messages: Vec<String> = errs.iter().map(|e| format!("{e}")).collect();
            format!("Failed to parse runtime framework '{input}': {}", messages.join("; "))
        })
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
