use std::path::PathBuf;

use clap::Parser;
use orgchart::{
    domain::{visible_rows, ExpandState},
    Graph,
};
use tracing::instrument;

use super::{
    load_snapshot,
    terminal::{terminal_width, truncate, Colorize},
};

#[derive(Debug, Parser)]
pub struct Tree {
    /// The form document (JSON or YAML) holding the positions
    file: PathBuf,

    /// Hide the subordinates of these positions (by name)
    #[arg(long, value_name = "NAME")]
    collapse: Vec<String>,
}

impl Tree {
    #[instrument(level = "debug")]
    pub fn run(self) -> anyhow::Result<()> {
        let snapshot = load_snapshot(&self.file)?;
        let graph = Graph::build(&snapshot)?;

        let mut state = ExpandState::expanded();
        for name in &self.collapse {
            let position = snapshot
                .find_by_name(name)
                .ok_or_else(|| anyhow::anyhow!("no position named '{name}'"))?;
            state.collapse(position.id());
        }

        let width = terminal_width().map_or(usize::MAX, usize::from);

        for row in visible_rows(&graph, &state) {
            let position = graph.position(row.index);
            let marker = match (row.has_children, row.collapsed) {
                (false, _) => " ",
                (true, false) => "▾",
                (true, true) => "▸",
            };
            let line = format!("{}{marker} {}", "  ".repeat(row.depth), position.name());
            let count = position
                .employee_count()
                .map(|count| format!(" ({count})").dim())
                .unwrap_or_default();
            println!("{}{count}", truncate(&line, width));
        }

        Ok(())
    }
}
