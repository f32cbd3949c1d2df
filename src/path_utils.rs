//! Lexical path utilities.
//!
//! Everything here works on path *strings* only: nothing touches the
//! filesystem, follows symlinks, or asks the host about case sensitivity.
//! Both `/` and `\` are recognised as separators on every platform and
//! results always use `/`, which is how project files store paths.
//!
//! ```
//! use nunitproj_rs::path_utils::{canonicalize, relative_path, same_path_or_under};
//!
//! assert_eq!(canonicalize(r"C:\folder1\.\folder2\..\file.tmp"), "C:/folder1/file.tmp");
//! assert_eq!(relative_path("/folder1", "/folder2/folder3").as_deref(), Some("../folder2/folder3"));
//! assert!(same_path_or_under("/folder1/folder2", "/folder1/./folder2/junk/../folder3", false));
//! ```

/// Separator used when joining path segments.
pub const PREFERRED_SEPARATOR: char = '/';

/// Separator between directories of a private bin path list.
pub const PATH_LIST_SEPARATORS: [char; 2] = [';', ':'];

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// `X:` at the start of the string.
fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic()
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Canonicalization
// ═══════════════════════════════════════════════════════════════════════════════

/// Return the canonical form of a path, using `/` as the separator.
///
/// `.` segments are dropped.  A `..` segment is dropped together with the
/// segment before it, unless that segment is itself `..` or the root, so
/// unresolved `..` runs and the root survive.  Empty segments other than
/// the root marker pass through, which keeps trailing separators intact.
pub fn canonicalize(path: &str) -> String {
    let mut parts: Vec<&str> = path.split(is_separator).collect();
    let rooted = parts.len() > 1
        && (parts[0].is_empty() || (parts[0].len() == 2 && has_drive_prefix(parts[0])));

    let mut index = 0;
    while index < parts.len() {
        match parts[index] {
            "." => {
                parts.remove(index);
            }
            ".." if index > 0 && parts[index - 1] != ".." && !(index == 1 && rooted) => {
                parts.remove(index);
                index -= 1;
                parts.remove(index);
            }
            _ => index += 1,
        }
    }

    // A rooted path that resolved to its root alone: keep the separator.
    if rooted && parts.len() == 1 {
        parts.push("");
    }
    parts.join("/")
}

/// Replace every `\` with `/`.
pub fn standardize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Roots
// ═══════════════════════════════════════════════════════════════════════════════

/// The root component of `path`, or `""` for a relative path.
///
/// Recognised forms: `X:\` / `X:/`, a bare `X:`, a UNC `//server/share`
/// prefix, and a single leading separator.
pub fn path_root(path: &str) -> &str {
    let mut chars = path.chars();
    if has_drive_prefix(path) {
        return match path[2..].chars().next() {
            Some(c) if is_separator(c) => &path[..3],
            _ => &path[..2],
        };
    }

    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if is_separator(a) && is_separator(b) => {
            let separators: Vec<usize> = path[2..]
                .char_indices()
                .filter(|&(_, c)| is_separator(c))
                .map(|(i, _)| i + 2)
                .take(2)
                .collect();
            match separators.get(1) {
                Some(&end) => &path[..end],
                None => path,
            }
        }
        (Some(a), _) if is_separator(a) => &path[..1],
        _ => "",
    }
}

/// True when the path carries a root component.
pub fn is_rooted(path: &str) -> bool {
    !path_root(path).is_empty()
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Comparison
// ═══════════════════════════════════════════════════════════════════════════════

/// Compare two paths or path segments.  If both start with `X:` the whole
/// comparison ignores case, otherwise it is exact.
pub fn paths_equal(a: &str, b: &str) -> bool {
    let drive_like = |s: &str| s.len() >= 2 && s.as_bytes()[1] == b':';
    if drive_like(a) && drive_like(b) {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

/// True if both paths canonicalize to the same string.  Paths reaching the
/// same directory through different drive letters or shares are not equal.
pub fn same_path(a: &str, b: &str, ignore_case: bool) -> bool {
    let a = canonicalize(a);
    let b = canonicalize(b);
    if ignore_case {
        a.eq_ignore_ascii_case(&b)
    } else {
        a == b
    }
}

/// True if `b` is the same as `a` or lies directly or indirectly beneath it.
///
/// The match must end on a separator boundary, so `/folder1` is not a
/// prefix of `/folder12/x`.  Without `ignore_case` the drive-letter rule of
/// [`paths_equal`] applies.
pub fn same_path_or_under(a: &str, b: &str, ignore_case: bool) -> bool {
    let a = canonicalize(a);
    let b = canonicalize(b);
    let equal = |x: &str, y: &str| {
        if ignore_case {
            x.eq_ignore_ascii_case(y)
        } else {
            paths_equal(x, y)
        }
    };

    if a.len() > b.len() {
        return false;
    }
    if a.len() == b.len() {
        return equal(&a, &b);
    }

    let Some(prefix) = b.get(..a.len()) else {
        return false;
    };
    if !equal(&a, prefix) {
        return false;
    }

    a.ends_with(PREFERRED_SEPARATOR) || b[a.len()..].starts_with(PREFERRED_SEPARATOR)
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Relative paths
// ═══════════════════════════════════════════════════════════════════════════════

fn split_path(path: &str) -> Vec<&str> {
    path.split(is_separator).filter(|s| !s.is_empty()).collect()
}

/// The relative path from directory `from` to `to`.
///
/// Both inputs are canonicalized first.  A `to` without a root is returned
/// as is, without consulting `from`.  `None` means the two paths live under
/// different roots (e.g. different drive letters) and cannot be related.
pub fn relative_path(from: &str, to: &str) -> Option<String> {
    let from = canonicalize(from);
    let to = canonicalize(to);

    let to_root = path_root(&to);
    if to_root.is_empty() {
        return Some(to);
    }
    let from_root = path_root(&from);
    if !paths_equal(to_root, from_root) {
        return None;
    }

    let from_segments = split_path(&from[from_root.len()..]);
    let to_segments = split_path(&to[to_root.len()..]);

    let common = from_segments
        .iter()
        .zip(&to_segments)
        .take_while(|(a, b)| paths_equal(a, b))
        .count();

    let mut parts: Vec<&str> = Vec::new();
    if common < from_segments.len() {
        parts.push("..");
    }
    for _ in common + 1..from_segments.len() {
        parts.push("..");
    }
    parts.extend(&to_segments[common..]);

    Some(parts.join("/"))
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Misc helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Join `relative` onto `base`.  A rooted `relative` replaces `base`.
pub fn combine(base: &str, relative: &str) -> String {
    if is_rooted(relative) || base.is_empty() {
        return standardize_separators(relative);
    }
    if relative.is_empty() {
        return standardize_separators(base);
    }
    let base = standardize_separators(base);
    let trimmed = base.strip_suffix(PREFERRED_SEPARATOR).unwrap_or(&base);
    format!("{trimmed}/{}", standardize_separators(relative))
}

/// Everything before the last separator, keeping the root intact:
/// `/a/b.nunit` → `/a`, `/b.nunit` → `/`, `b.nunit` → `""`.
pub fn directory_name(path: &str) -> &str {
    let root = path_root(path);
    match path[root.len()..].rfind(is_separator) {
        Some(i) => &path[..root.len() + i],
        None => root,
    }
}

/// The last segment of the path.
pub fn file_name(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(i) => &path[i + 1..],
        None => &path[path_root(path).len()..],
    }
}

/// Why `path` cannot be a path at all, or `None` if it is syntactically fine.
pub fn invalid_path_reason(path: &str) -> Option<&'static str> {
    if path.contains('\0') {
        Some("contains a NUL character")
    } else if path.chars().any(|c| c.is_ascii_control()) {
        Some("contains a control character")
    } else if path.contains(['<', '>', '|', '"', '*', '?']) {
        Some("contains one of the characters < > | \" * ?")
    } else {
        None
    }
}

/// True for `.dll` and `.exe` files, ignoring case.
pub fn is_assembly_file_type(path: &str) -> bool {
    let name = file_name(path);
    match name.rfind('.') {
        Some(i) => {
            let extension = &name[i + 1..];
            extension.eq_ignore_ascii_case("dll") || extension.eq_ignore_ascii_case("exe")
        }
        None => false,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
