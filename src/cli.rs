use std::path::{Path, PathBuf};

mod render;
mod reorder;
mod terminal;
mod tree;
mod validate;

use anyhow::Context;
use clap::ArgAction;
use orgchart::{Config, Form, Snapshot};
use render::Render;
use reorder::Reorder;
use tree::Tree;
use validate::Validate;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file
    #[arg(short, long, default_value = "orgchart.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = Config::load_or_default(&self.config).map_err(anyhow::Error::msg)?;
        self.command.run(&config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Validate the hierarchy described by a form
    ///
    /// Exits with status 2 if the hierarchy has errors.
    Validate(Validate),

    /// Move a position and re-validate the result
    ///
    /// The move is always applied; errors it introduces are reported
    /// afterwards.
    Reorder(Reorder),

    /// Render the hierarchy into numbered document articles
    Render(Render),

    /// Show the hierarchy as an indented tree
    Tree(Tree),
}

impl Command {
    fn run(self, config: &Config) -> anyhow::Result<()> {
        match self {
            Self::Validate(command) => command.run(config)?,
            Self::Reorder(command) => command.run(config)?,
            Self::Render(command) => command.run(config)?,
            Self::Tree(command) => command.run()?,
        }
        Ok(())
    }
}

/// Reads a form and normalizes it into a snapshot.
fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let form = Form::load(path).with_context(|| format!("failed to load {}", path.display()))?;
    Snapshot::load(form.positions)
        .with_context(|| format!("invalid positions in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn parses_reorder_arguments() {
        let cli = Cli::try_parse_from([
            "orgchart", "-vv", "reorder", "form.json", "--source", "2", "--target", "0",
            "--child",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, PathBuf::from("orgchart.toml"));
        assert!(matches!(cli.command, Command::Reorder(_)));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["orgchart"]).is_err());
    }

    #[test]
    fn load_snapshot_reads_yaml_forms() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("positions.yaml");
        std::fs::write(
            &path,
            "positions:\n  - name: CEO\n  - name: CFO\n    reportsTo: [CEO]\n",
        )
        .unwrap();

        let snapshot = load_snapshot(&path).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.positions()[1].level(), 1);
    }

    #[test]
    fn load_snapshot_reports_nameless_positions() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("positions.json");
        std::fs::write(&path, r#"[{"name": "CEO"}, {"employeeCount": 2}]"#).unwrap();

        let err = load_snapshot(&path).unwrap_err();
        assert!(format!("{err:#}").contains("position #2 has no name"));
    }
}
