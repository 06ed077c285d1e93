//! Command-line surface

use crate::api::DEFAULT_PORT;
use crate::catalog::Filter;
use crate::config::ServerConfig;
use crate::error::{NessusError, Result};
use clap::Parser;
use std::path::PathBuf;

/// List, export and import Nessus scan results.
///
/// List:   nessus-result -s SERVER -l
/// Export: nessus-result -s SERVER -e [-f PATTERN] [--folder-filter PATTERN]
/// Import: nessus-result -s SERVER -r FILE... [-d FOLDER]
#[derive(Parser, Debug)]
#[command(name = "nessus-result", version, about, long_about = None)]
pub struct Cli {
    /// Server name or IP
    #[arg(short, long, env = "NESSUS_SERVER", default_value = "")]
    pub server: String,

    /// Server port
    #[arg(long, env = "NESSUS_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Username (prompted when not given)
    #[arg(short, long, env = "NESSUS_USERNAME")]
    pub username: Option<String>,

    /// Password (prompted when not given)
    #[arg(short, long, env = "NESSUS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Accept self-signed server certificates
    #[arg(long)]
    pub insecure: bool,

    /// Verbose logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// List available results
    #[arg(short = 'l')]
    pub list: bool,

    /// Export results
    #[arg(short = 'e')]
    pub export: bool,

    /// Result name filter, Unix filename pattern style
    #[arg(short, long, default_value = "")]
    pub filter: String,

    /// Folder name filter, Unix filename pattern style
    #[arg(long, default_value = "")]
    pub folder_filter: String,

    /// Overwrite existing exported files
    #[arg(long)]
    pub force: bool,

    /// Export every result into the output directory, without folder subdirectories
    #[arg(long)]
    pub skip_dirs: bool,

    /// Directory exported results are written under
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Import results (implied by -r)
    #[arg(short = 'i')]
    pub import: bool,

    /// Result files to import
    #[arg(short, long = "result", num_args = 1..)]
    pub results: Vec<PathBuf>,

    /// Folder imported results are moved into (created when missing)
    #[arg(short = 'd', long)]
    pub folder: Option<String>,
}

/// The one thing an invocation does.
#[derive(Debug, Clone)]
pub enum Action {
    List {
        filter: Filter,
    },
    Export {
        filter: Filter,
        force: bool,
        skip_dirs: bool,
        output_dir: PathBuf,
    },
    Import {
        files: Vec<PathBuf>,
        folder: Option<String>,
    },
}

impl Cli {
    /// Check that a server and exactly one action were given.
    pub fn validate(&self) -> Result<(ServerConfig, Action)> {
        if self.server.trim().is_empty() {
            return Err(NessusError::Usage("No server specified (-s)".into()));
        }

        let importing = self.import || !self.results.is_empty();
        let selected = [self.list, self.export, importing]
            .iter()
            .filter(|on| **on)
            .count();
        if selected == 0 {
            return Err(NessusError::Usage("No action specified (-l | -e | -i)".into()));
        }
        if selected > 1 {
            return Err(NessusError::Usage(
                "Only one action may be specified (-l | -e | -i)".into(),
            ));
        }

        let action = if self.list {
            Action::List {
                filter: Filter::new(&self.filter, &self.folder_filter)?,
            }
        } else if self.export {
            Action::Export {
                filter: Filter::new(&self.filter, &self.folder_filter)?,
                force: self.force,
                skip_dirs: self.skip_dirs,
                output_dir: self.output_dir.clone(),
            }
        } else {
            if self.results.is_empty() {
                return Err(NessusError::Usage(
                    "You have to specify at least one result file (-r)".into(),
                ));
            }
            Action::Import {
                files: self.results.clone(),
                folder: self.folder.clone().filter(|f| !f.is_empty()),
            }
        };

        let server = ServerConfig {
            host: self.server.trim().to_string(),
            port: self.port,
            insecure: self.insecure,
        };
        Ok((server, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ResultStatus, ScanResult};

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["nessus-result"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn result(name: &str, folder: &str) -> ScanResult {
        ScanResult {
            id: "1".into(),
            name: name.into(),
            timestamp: 0,
            status: ResultStatus::Completed,
            folder_id: None,
            folder: folder.into(),
        }
    }

    #[test]
    fn missing_server_is_usage_error() {
        let err = parse(&["-l"]).validate().unwrap_err();
        assert!(matches!(err, NessusError::Usage(ref m) if m.contains("-s")));
    }

    #[test]
    fn missing_action_is_usage_error() {
        let err = parse(&["-s", "scanner"]).validate().unwrap_err();
        assert!(matches!(err, NessusError::Usage(ref m) if m.contains("No action")));
    }

    #[test]
    fn conflicting_actions_are_rejected() {
        let err = parse(&["-s", "scanner", "-l", "-e"]).validate().unwrap_err();
        assert!(matches!(err, NessusError::Usage(_)));
        let err = parse(&["-s", "scanner", "-l", "-r", "a.nessus"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, NessusError::Usage(_)));
    }

    #[test]
    fn list_applies_folder_filter() {
        let (_, action) = parse(&["-s", "scanner", "-l", "--folder-filter", "Prod*"])
            .validate()
            .unwrap();
        match action {
            Action::List { filter } => {
                assert!(filter.matches(&result("any", "Production")));
                assert!(!filter.matches(&result("any", "Staging")));
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn import_flag_without_files_is_rejected() {
        let err = parse(&["-s", "scanner", "-i"]).validate().unwrap_err();
        assert!(matches!(err, NessusError::Usage(ref m) if m.contains("-r")));
    }

    #[test]
    fn result_files_select_import() {
        let (server, action) = parse(&[
            "-s", "scanner", "-r", "a.nessus", "b.nessus", "-d", "Audit",
        ])
        .validate()
        .unwrap();
        assert_eq!(server.base_url(), "https://scanner:8834");
        match action {
            Action::Import { files, folder } => {
                assert_eq!(files, vec![PathBuf::from("a.nessus"), PathBuf::from("b.nessus")]);
                assert_eq!(folder.as_deref(), Some("Audit"));
            }
            other => panic!("expected import, got {other:?}"),
        }
    }

    #[test]
    fn export_carries_options() {
        let (server, action) = parse(&[
            "-s",
            "scanner",
            "--port",
            "9000",
            "-e",
            "--force",
            "--skip-dirs",
            "-f",
            "web*",
            "--folder-filter",
            "DMZ*",
        ])
        .validate()
        .unwrap();
        assert_eq!(server.port, 9000);
        match action {
            Action::Export {
                filter,
                force,
                skip_dirs,
                output_dir,
            } => {
                assert!(force);
                assert!(skip_dirs);
                assert_eq!(output_dir, PathBuf::from("."));
                assert!(filter.matches(&result("web-weekly", "DMZ-east")));
                assert!(!filter.matches(&result("web-weekly", "Staging")));
                assert!(!filter.matches(&result("db-weekly", "DMZ-east")));
            }
            other => panic!("expected export, got {other:?}"),
        }
    }
}
