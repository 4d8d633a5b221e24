use std::{io, path::PathBuf};

use clap::Parser;
use orgchart::{
    domain::{render, PlainTextSink, RenderError},
    Config,
};
use tracing::instrument;

use super::{load_snapshot, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Render {
    /// The form document (JSON or YAML) holding the positions
    file: PathBuf,

    /// Number of the first article (overrides the configuration)
    #[arg(long, value_name = "N")]
    base_article: Option<u32>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    format: OutputFormat,

    /// Skip validation and render the hierarchy as it is
    #[arg(long)]
    assume_valid: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Render {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let snapshot = load_snapshot(&self.file)?;
        let base_article = self.base_article.unwrap_or_else(|| config.base_article());

        let rendered = match render(
            &snapshot,
            self.assume_valid,
            base_article,
            &config.render_options(),
        ) {
            Ok(rendered) => rendered,
            Err(RenderError::Invalid(report)) => {
                for error in &report.errors {
                    eprintln!("{}", format!("✗ {error}").warning());
                }
                anyhow::bail!("refusing to render an invalid hierarchy");
            }
            Err(other) => return Err(other.into()),
        };

        match self.format {
            OutputFormat::Text => {
                let stdout = io::stdout();
                let mut sink = PlainTextSink::new(stdout.lock());
                rendered.write_to(&mut sink)?;
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rendered)?),
        }

        tracing::info!(
            fingerprint = %rendered.fingerprint(),
            next_article = rendered.next_article,
            "rendered document body"
        );

        Ok(())
    }
}
