//! Folder and result listing, plus client-side filtering

use crate::api::{epoch_seconds, string_or_number, OneOrMany, Session};
use crate::error::{NessusError, Result};
use globset::{GlobBuilder, GlobMatcher};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// A server-side folder (tag).
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

/// Folders in the order the server listed them.
///
/// Display names are not unique on the server; lookups by name return the
/// first folder carrying it.
#[derive(Debug, Clone, Default)]
pub struct Folders(Vec<Folder>);

impl Folders {
    pub fn new(folders: Vec<Folder>) -> Self {
        Folders(folders)
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.0.iter().find(|f| f.id == id).map(|f| f.name.as_str())
    }

    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|f| f.name == name).map(|f| f.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Completed,
    Running,
    Paused,
    #[serde(alias = "stopped")]
    Canceled,
    #[serde(other)]
    Unknown,
}

/// A stored scan result, joined with its folder's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub id: String,
    pub name: String,
    pub timestamp: i64,
    pub status: ResultStatus,
    pub folder_id: Option<String>,
    /// Empty when the result has no folder or points at an unknown one.
    pub folder: String,
}

#[derive(Deserialize, Debug)]
struct TagList {
    #[serde(default)]
    tags: OneOrMany<Folder>,
}

#[derive(Deserialize, Debug)]
struct ResultList {
    #[serde(default)]
    result: OneOrMany<RawResult>,
}

#[derive(Deserialize, Debug)]
struct RawResult {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    name: String,
    #[serde(deserialize_with = "epoch_seconds")]
    timestamp: i64,
    status: ResultStatus,
    #[serde(default)]
    tags: Vec<Value>,
}

/// `tags[0]` is either a bare id or an object carrying one.
fn tag_ref(tag: &Value) -> Option<String> {
    match tag {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("id").and_then(tag_ref),
        _ => None,
    }
}

/// Fetch all folders.
pub fn list_folders(session: &Session) -> Result<Folders> {
    let list: TagList = session.call("/tag/list", &[])?;
    let folders = Folders::new(list.tags.into_vec());
    debug!(count = folders.len(), "folders listed");
    Ok(folders)
}

/// Fetch completed results, each annotated with its folder name.
pub fn list_results(session: &Session, folders: &Folders) -> Result<Vec<ScanResult>> {
    let list: ResultList = session.call("/result/list", &[])?;
    let results: Vec<ScanResult> = list
        .result
        .into_vec()
        .into_iter()
        .filter(|r| r.status == ResultStatus::Completed)
        .map(|r| {
            let folder_id = r.tags.first().and_then(tag_ref);
            let folder = folder_id
                .as_deref()
                .and_then(|id| folders.name_of(id))
                .unwrap_or_default()
                .to_string();
            ScanResult {
                id: r.id,
                name: r.name,
                timestamp: r.timestamp,
                status: r.status,
                folder_id,
                folder,
            }
        })
        .collect();
    debug!(count = results.len(), "completed results listed");
    Ok(results)
}

/// Name and folder glob patterns. An empty pattern matches everything.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    name: Option<GlobMatcher>,
    folder: Option<GlobMatcher>,
}

impl Filter {
    pub fn new(name_pattern: &str, folder_pattern: &str) -> Result<Self> {
        Ok(Filter {
            name: compile(name_pattern)?,
            folder: compile(folder_pattern)?,
        })
    }

    pub fn matches(&self, result: &ScanResult) -> bool {
        let hit =
            |m: &Option<GlobMatcher>, s: &str| m.as_ref().map_or(true, |m| m.is_match(s));
        hit(&self.name, &result.name) && hit(&self.folder, &result.folder)
    }
}

fn compile(pattern: &str) -> Result<Option<GlobMatcher>> {
    if pattern.is_empty() {
        return Ok(None);
    }
    // `*` and `?` cross `/` like fnmatch, and `\` stays a literal character.
    let glob = GlobBuilder::new(&fnmatch_to_glob(pattern))
        .literal_separator(false)
        .backslash_escape(false)
        .build()
        .map_err(|e| NessusError::Usage(format!("Invalid pattern '{pattern}': {e}")))?;
    Ok(Some(glob.compile_matcher()))
}

/// Rewrite an fnmatch pattern so globset reads it the same way: braces are
/// literal, and a `[` without a closing `]` is literal too.
fn fnmatch_to_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '{' => out.push_str("[{]"),
            '}' => out.push_str("[}]"),
            '[' => {
                // a `]` right after `[` or `[!` belongs to the class
                let mut j = i + 1;
                if chars.get(j) == Some(&'!') {
                    j += 1;
                }
                if chars.get(j) == Some(&']') {
                    j += 1;
                }
                match chars[j.min(chars.len())..].iter().position(|&c| c == ']') {
                    Some(offset) => {
                        let end = j + offset;
                        out.extend(&chars[i..=end]);
                        i = end;
                    }
                    None => out.push_str("[[]"),
                }
            }
            c => out.push(c),
        }
        i += 1;
    }
    out
}

/// Keep the results matching both patterns, preserving order.
pub fn match_filter<'a>(results: &'a [ScanResult], filter: &Filter) -> Vec<&'a ScanResult> {
    results.iter().filter(|r| filter.matches(r)).collect()
}
