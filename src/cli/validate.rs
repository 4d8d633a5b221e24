use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use orgchart::{domain::validate_inputs, Config, Form, ValidationReport};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Validate the structure of a position hierarchy")]
pub struct Validate {
    /// The form document (JSON or YAML) holding the positions
    file: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Summary,
}

impl Validate {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let form = Form::load(&self.file)
            .with_context(|| format!("failed to load {}", self.file.display()))?;

        let report = validate_inputs(&form.positions, config.validation_options());

        match self.output {
            OutputFormat::Table => self.output_table(&report, form.positions.len()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Summary => println!(
                "errors={} warnings={} missing={}",
                report.errors.len(),
                report.warnings.len(),
                report.missing.len()
            ),
        }

        if !report.is_valid() {
            std::process::exit(2);
        }

        Ok(())
    }

    fn output_table(&self, report: &ValidationReport, positions: usize) {
        if self.quiet {
            for error in &report.errors {
                eprintln!("{}", format!("✗ {error}").warning());
            }
            return;
        }

        println!("Validating {positions} positions...\n");

        if report.errors.is_empty() {
            println!("✓ Structure:  no errors");
        } else {
            println!(
                "{}",
                format!("✗ Structure:  {} errors", report.errors.len()).warning()
            );
            for error in &report.errors {
                println!("  • {error}");
            }
        }

        if !report.missing.is_empty() {
            println!(
                "{}",
                format!("! Missing:    {} required fields", report.missing.len()).info()
            );
            for missing in &report.missing {
                println!("  • {missing}");
            }
        }

        if !report.warnings.is_empty() {
            println!("{}", format!("! Warnings:   {}", report.warnings.len()).info());
            for warning in &report.warnings {
                println!("  • {}", warning.dim());
            }
        }

        if report.is_valid() {
            println!("\n{}", "Hierarchy is valid".success());
        } else {
            println!(
                "\n{}",
                "Fix the errors above before generating the document".warning()
            );
        }
    }
}
