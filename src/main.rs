// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, hand over to `ui::run`.
// - Any error bubbles up as `anyhow::Error`, which prints it and exits with 1.

use clap::Parser;
use nessus_result::{cli::Cli, ui};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // clap would exit with 2 on bad arguments; usage errors are 1 here.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut out = std::io::stdout().lock();
    ui::run(cli, &mut ui::TerminalPrompt, &mut out)
}
