// UI layer: credential prompts, progress output and the three workflows.
// Each workflow writes its user-facing lines to the `out` writer it is given
// (stdout in the binary) and stops at the first error.

use crate::api::Session;
use crate::catalog::{list_folders, list_results, match_filter, Filter, ScanResult};
use crate::cli::{Action, Cli};
use crate::config::{CredentialSource, Credentials};
use crate::error::{NessusError, Result as NessusResult};
use crate::transfer::{
    export_result, import_result, resolve_export_path, should_skip_existing, write_export,
    FolderResolution,
};
use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use clap::CommandFactory;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Asks for missing credentials on the terminal. The password is not echoed.
pub struct TerminalPrompt;

impl CredentialSource for TerminalPrompt {
    fn username(&mut self) -> NessusResult<String> {
        Input::<String>::new()
            .with_prompt("Enter username")
            .interact_text()
            .map_err(NessusError::Prompt)
    }

    fn password(&mut self) -> NessusResult<String> {
        Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(NessusError::Prompt)
    }
}

/// Options for an export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub force: bool,
    pub skip_dirs: bool,
    pub output_dir: PathBuf,
}

/// Counts reported at the end of an export run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub exported: usize,
    pub skipped: usize,
}

/// `YYYY-MM-DD HH:MM:SS` in local time.
pub fn format_timestamp(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}

pub fn listing_line(result: &ScanResult) -> String {
    format!(
        "{} -- {} -- {}",
        format_timestamp(result.timestamp),
        result.folder,
        result.name
    )
}

/// Spinner on stderr while a transfer is in flight. Hidden when stderr is
/// not a terminal.
fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

fn fetch_matching(session: &Session, filter: &Filter) -> Result<Vec<ScanResult>> {
    let folders = list_folders(session).context("Listing folders")?;
    let results = list_results(session, &folders).context("Listing results")?;
    Ok(match_filter(&results, filter).into_iter().cloned().collect())
}

/// Print one line per matching completed result. Returns how many.
pub fn list(session: &Session, filter: &Filter, out: &mut dyn Write) -> Result<usize> {
    let results = fetch_matching(session, filter)?;
    for result in &results {
        writeln!(out, "{}", listing_line(result))?;
    }
    Ok(results.len())
}

/// Download every matching result to disk, skipping files that already
/// exist unless `force` is set.
pub fn export(
    session: &Session,
    filter: &Filter,
    options: &ExportOptions,
    out: &mut dyn Write,
) -> Result<ExportSummary> {
    let mut summary = ExportSummary::default();
    for result in fetch_matching(session, filter)? {
        let path = resolve_export_path(&result, options.skip_dirs, &options.output_dir)?;
        if should_skip_existing(&path, options.force) {
            writeln!(
                out,
                "File {} ({}) already exists ==> skipping (use --force to overwrite)",
                path.display(),
                format_timestamp(result.timestamp)
            )?;
            summary.skipped += 1;
            continue;
        }

        write!(out, "Exporting {} ... ", result.name)?;
        out.flush()?;
        let progress = spinner("downloading")?;
        let written = export_result(session, &result.id)
            .and_then(|content| write_export(&path, &content));
        progress.finish_and_clear();
        written.with_context(|| format!("Exporting '{}'", result.name))?;
        writeln!(out, "Done")?;
        summary.exported += 1;
    }
    info!(exported = summary.exported, skipped = summary.skipped, "export finished");
    Ok(summary)
}

/// Upload each file in turn. The first failure aborts the remaining files.
pub fn import(
    session: &Session,
    files: &[PathBuf],
    folder: Option<&str>,
    out: &mut dyn Write,
) -> Result<usize> {
    for file in files {
        write!(out, "Importing {} ... ", file.display())?;
        out.flush()?;
        let progress = spinner("uploading")?;
        let imported = import_result(session, file, folder);
        progress.finish_and_clear();
        let outcome = imported.with_context(|| format!("Importing '{}'", file.display()))?;
        writeln!(out, "Done")?;
        if let (Some(FolderResolution::Created(_)), Some(name)) = (&outcome.folder, folder) {
            writeln!(out, "Folder '{name}' did not exist and was created")?;
        }
    }
    Ok(files.len())
}

/// Full invocation: validate, resolve credentials, log in, run the action.
pub fn run(cli: Cli, source: &mut dyn CredentialSource, out: &mut dyn Write) -> Result<()> {
    let (server, action) = match cli.validate() {
        Ok(parsed) => parsed,
        Err(e) => {
            // the message itself is reported once, by the caller
            writeln!(out, "{}", Cli::command().render_help())?;
            return Err(e.into());
        }
    };

    let credentials = Credentials::resolve(cli.username, cli.password, source)?;
    let base_url = server.base_url();
    let session = Session::login(&base_url, &credentials, server.insecure)?;

    match action {
        Action::List { filter } => {
            list(&session, &filter, out)?;
        }
        Action::Export {
            filter,
            force,
            skip_dirs,
            output_dir,
        } => {
            let options = ExportOptions {
                force,
                skip_dirs,
                output_dir,
            };
            export(&session, &filter, &options, out)?;
        }
        Action::Import { files, folder } => {
            import(&session, &files, folder.as_deref(), out)?;
        }
    }
    Ok(())
}
