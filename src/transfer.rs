//! Result export, import and folder moves

use crate::api::{string_or_number, Session};
use crate::catalog::{list_folders, ScanResult};
use crate::error::{NessusError, Result};
use reqwest::blocking::multipart;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension of the native report format.
pub const EXPORT_EXTENSION: &str = "nessus";

/// How the destination folder of a moved result was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderResolution {
    Existing(String),
    Created(String),
}

impl FolderResolution {
    pub fn id(&self) -> &str {
        match self {
            FolderResolution::Existing(id) | FolderResolution::Created(id) => id,
        }
    }
}

/// What an import produced on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub result_id: String,
    pub uploaded_as: String,
    pub folder: Option<FolderResolution>,
}

#[derive(Deserialize, Debug)]
struct IdOnly {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
}

#[derive(Deserialize, Debug)]
struct ImportReply {
    result: IdOnly,
}

#[derive(Deserialize, Debug)]
struct TagCreateReply {
    tag: IdOnly,
}

/// Download one result in its native format.
pub fn export_result(session: &Session, result_id: &str) -> Result<Vec<u8>> {
    let content = session.download("/file/report/download", &[("report", result_id)])?;
    debug!(result_id, bytes = content.len(), "result downloaded");
    Ok(content)
}

/// Turn a server-supplied folder or result name into a single path
/// component: separators and NUL become `_`, and a leading `..` becomes `__`.
pub fn sanitize_path_component(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    match mapped.strip_prefix("..") {
        Some(rest) => format!("__{rest}"),
        None if mapped == "." => "_".to_string(),
        None => mapped,
    }
}

/// Destination for an exported result: `<base>/<folder>/<name>.nessus`, or
/// `<base>/<name>.nessus` when nesting is skipped or the result has no
/// folder. The folder directory is created when needed. The result always
/// lands under `base_dir`.
pub fn resolve_export_path(
    result: &ScanResult,
    skip_dirs: bool,
    base_dir: &Path,
) -> Result<PathBuf> {
    let file_name = format!(
        "{}.{}",
        sanitize_path_component(&result.name),
        EXPORT_EXTENSION
    );
    if skip_dirs || result.folder.is_empty() {
        return Ok(base_dir.join(file_name));
    }
    let dir = base_dir.join(sanitize_path_component(&result.folder));
    fs::create_dir_all(&dir).map_err(|e| NessusError::filesystem(&dir, e))?;
    Ok(dir.join(file_name))
}

/// True when `path` exists and we were not asked to overwrite it.
pub fn should_skip_existing(path: &Path, force: bool) -> bool {
    !force && path.exists()
}

pub fn write_export(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content).map_err(|e| NessusError::filesystem(path, e))
}

/// The upload endpoint chokes on path separators and colons in the
/// multipart file name.
pub fn sanitize_upload_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect()
}

/// Upload a local result file, register it as a new result and optionally
/// move it into `folder`.
pub fn import_result(
    session: &Session,
    local_path: &Path,
    folder: Option<&str>,
) -> Result<ImportOutcome> {
    let content = fs::read(local_path).map_err(|e| NessusError::filesystem(local_path, e))?;
    let uploaded_as = sanitize_upload_name(&local_path.to_string_lossy());

    let part = multipart::Part::bytes(content).file_name(uploaded_as.clone());
    let form = multipart::Form::new().part("Filedata", part);
    session.upload("/file/upload", form)?;
    debug!(file = %uploaded_as, "uploaded");

    let reply: ImportReply = session.call("/result/import", &[("file", uploaded_as.as_str())])?;
    let result_id = reply.result.id;
    info!(file = %uploaded_as, result_id = %result_id, "imported");

    let folder = match folder {
        Some(name) => Some(move_result(session, &result_id, name)?),
        None => None,
    };

    Ok(ImportOutcome {
        result_id,
        uploaded_as,
        folder,
    })
}

/// Put a result into the folder called `folder_name`, creating the folder
/// when none carries that name. With duplicate names the first listed wins.
pub fn move_result(
    session: &Session,
    result_id: &str,
    folder_name: &str,
) -> Result<FolderResolution> {
    let folders = list_folders(session)?;
    let resolution = match folders.id_of(folder_name) {
        Some(id) => FolderResolution::Existing(id.to_string()),
        None => {
            let reply: TagCreateReply = session.call("/tag/create", &[("name", folder_name)])?;
            info!(folder = folder_name, id = %reply.tag.id, "folder created");
            FolderResolution::Created(reply.tag.id)
        }
    };

    session.call::<serde_json::Value>(
        "/tag/replace",
        &[("id", result_id), ("tags", resolution.id())],
    )?;
    debug!(result_id, folder = folder_name, "result moved");
    Ok(resolution)
}
