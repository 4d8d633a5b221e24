use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use orgchart::{
    domain::{validate_snapshot, ReorderRequest},
    storage::Format,
    Config, Form,
};
use tracing::instrument;

use super::{load_snapshot, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Reorder {
    /// The form document (JSON or YAML) holding the positions
    file: PathBuf,

    /// Index of the position to move
    #[arg(long, short)]
    source: usize,

    /// Index to move the position to
    #[arg(long, short)]
    target: usize,

    /// Attach the moved position below the position currently at the target
    /// index, instead of making it a root
    #[arg(long)]
    child: bool,

    /// Write the result to this file instead of printing it
    #[arg(long, short)]
    write: Option<PathBuf>,
}

impl Reorder {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let snapshot = load_snapshot(&self.file)?;

        let request = ReorderRequest {
            source_index: self.source,
            target_index: self.target,
            make_child: self.child,
        };
        let moved = request.apply(&snapshot)?;
        let form = Form::from(&moved);

        if let Some(path) = &self.write {
            form.save(path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("{}", format!("Wrote {}", path.display()).success());
        } else {
            let format = Format::from_path(&self.file)?;
            println!("{}", form.render(format)?);
        }

        // the move is accepted as-is; problems it introduced are reported here
        let report = validate_snapshot(&moved, config.validation_options());
        for error in &report.errors {
            eprintln!("{}", format!("✗ {error}").warning());
        }
        if !report.is_valid() {
            std::process::exit(2);
        }

        Ok(())
    }
}
