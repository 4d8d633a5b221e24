//! Structural validation of a position hierarchy.
//!
//! Validation never fails; every problem ends up in the returned
//! [`ValidationReport`]. Only `errors` block acceptance.

use std::collections::HashSet;

use serde::{ser::SerializeStruct, Serialize, Serializer};
use tracing::{debug, instrument};

use crate::domain::{
    graph::{BuildError, Relation},
    Graph, PositionInput, Snapshot,
};

/// The outcome of validating a hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that block acceptance.
    pub errors: Vec<String>,
    /// Advisory notices.
    pub warnings: Vec<String>,
    /// Required fields that were left empty.
    pub missing: Vec<String>,
}

impl ValidationReport {
    /// Whether the hierarchy may be accepted.
    ///
    /// Warnings and missing fields never block acceptance.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether there is anything at all to report.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.missing.is_empty()
    }

    fn extend(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.missing.extend(other.missing);
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut report = serializer.serialize_struct("ValidationReport", 4)?;
        report.serialize_field("isValid", &self.is_valid())?;
        report.serialize_field("errors", &self.errors)?;
        report.serialize_field("warnings", &self.warnings)?;
        report.serialize_field("missing", &self.missing)?;
        report.end()
    }
}

/// Switches for the advisory checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Report positions that are connected to nothing.
    pub warn_on_orphans: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            warn_on_orphans: true,
        }
    }
}

/// Validates a hierarchy graph with the default options.
#[must_use]
pub fn validate(graph: &Graph) -> ValidationReport {
    validate_with(graph, ValidationOptions::default())
}

/// Validates a hierarchy graph.
///
/// Checks run in a fixed sequence (self references, dangling references,
/// cycles, orphans, per-position fields) and each check visits positions in
/// sibling order, so identical input always yields an identical report.
#[instrument(level = "debug", skip(graph), fields(positions = graph.len()))]
pub fn validate_with(graph: &Graph, options: ValidationOptions) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_self_references(graph, &mut report);
    check_dangling(graph, &mut report);
    check_cycles(graph, &mut report);
    if options.warn_on_orphans {
        check_orphans(graph, &mut report);
    }
    check_fields(graph.snapshot(), &mut report);

    debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        missing = report.missing.len(),
        "validated hierarchy"
    );
    report
}

/// Builds the graph for a snapshot and validates it.
///
/// Duplicate names prevent the graph from being built; they are reported as
/// errors and only the per-position field checks run.
#[must_use]
pub fn validate_snapshot(snapshot: &Snapshot, options: ValidationOptions) -> ValidationReport {
    match Graph::build(snapshot) {
        Ok(graph) => validate_with(&graph, options),
        Err(BuildError::DuplicateNames(duplicates)) => {
            let mut report = ValidationReport {
                errors: duplicates.iter().map(ToString::to_string).collect(),
                ..ValidationReport::default()
            };
            check_fields(snapshot, &mut report);
            report
        }
    }
}

/// Runs the full pipeline on raw form input.
///
/// Positions without a name are reported (as missing and as an error) and
/// left out of the remaining checks.
#[must_use]
pub fn validate_inputs(inputs: &[PositionInput], options: ValidationOptions) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut named = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.iter().enumerate() {
        if input.name.as_deref().is_some_and(|name| !name.trim().is_empty()) {
            named.push(input.clone());
        } else {
            report.missing.push(format!("position #{}: name", index + 1));
            report
                .errors
                .push(format!("position #{} has no name", index + 1));
        }
    }

    match Snapshot::load(named) {
        Ok(snapshot) => report.extend(validate_snapshot(&snapshot, options)),
        Err(err) => report.errors.push(err.to_string()),
    }

    report
}

fn check_self_references(graph: &Graph, report: &mut ValidationReport) {
    let mut reported = HashSet::new();
    for reference in graph.self_references() {
        if reported.insert(reference.position) {
            report.errors.push(format!(
                "{}: cannot report to/be subordinate to itself.",
                graph.position(reference.position).name()
            ));
        }
    }
}

fn check_dangling(graph: &Graph, report: &mut ValidationReport) {
    for dangling in graph.dangling() {
        let holder = graph.position(dangling.position).name();
        let message = match dangling.relation {
            Relation::ReportsTo => format!(
                "{holder}: reports to '{}', which is not a known position",
                dangling.reference
            ),
            Relation::Subordinates => format!(
                "{holder}: lists '{}' as a subordinate, which is not a known position",
                dangling.reference
            ),
        };
        report.warnings.push(message);
    }
}

fn check_cycles(graph: &Graph, report: &mut ValidationReport) {
    for cycle in find_cycles(graph) {
        let mut names: Vec<&str> = cycle
            .iter()
            .map(|&index| graph.position(index).name().as_str())
            .collect();
        names.push(names[0]);
        report
            .errors
            .push(format!("circular reporting line: {}", names.join(" -> ")));
    }
}

struct Frame {
    node: usize,
    superiors: Vec<usize>,
    cursor: usize,
}

/// Finds cycles in the reports-to relation.
///
/// Depth-first search from every unvisited position in sibling order. The
/// search keeps the current path (`on_stack`) apart from the global `visited`
/// set; reaching a node that is on the path closes a cycle. Each cycle is
/// returned once, starting at the node where it was first entered, and the
/// search continues until every node has been visited.
fn find_cycles(graph: &Graph) -> Vec<Vec<usize>> {
    let mut visited = vec![false; graph.len()];
    let mut on_stack = vec![false; graph.len()];
    let mut seen = HashSet::new();
    let mut cycles = Vec::new();

    for start in 0..graph.len() {
        if visited[start] {
            continue;
        }

        visited[start] = true;
        on_stack[start] = true;
        let mut frames = vec![Frame {
            node: start,
            superiors: graph.superiors(start),
            cursor: 0,
        }];

        while let Some(frame) = frames.last_mut() {
            let node = frame.node;
            let next = frame.superiors.get(frame.cursor).copied();
            frame.cursor += 1;

            let Some(next) = next else {
                on_stack[node] = false;
                frames.pop();
                continue;
            };

            if on_stack[next] {
                let Some(from) = frames.iter().position(|frame| frame.node == next) else {
                    continue;
                };
                let cycle: Vec<usize> = frames[from..].iter().map(|frame| frame.node).collect();
                if seen.insert(canonical(&cycle)) {
                    cycles.push(cycle);
                }
            } else if !visited[next] {
                visited[next] = true;
                on_stack[next] = true;
                frames.push(Frame {
                    node: next,
                    superiors: graph.superiors(next),
                    cursor: 0,
                });
            }
        }
    }

    cycles
}

/// Rotation of a cycle starting at its smallest index.
fn canonical(cycle: &[usize]) -> Vec<usize> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by_key(|&(_, node)| node)
        .map_or(0, |(offset, _)| offset);
    cycle[start..].iter().chain(&cycle[..start]).copied().collect()
}

fn check_orphans(graph: &Graph, report: &mut ValidationReport) {
    // a lone position is the whole hierarchy
    if graph.len() <= 1 {
        return;
    }

    for (index, position) in graph.snapshot().iter().enumerate() {
        if position.reports_to().is_empty()
            && position.subordinates().is_empty()
            && !graph.is_linked(index)
        {
            report.warnings.push(format!(
                "{}: position is not connected to any other position",
                position.name()
            ));
        }
    }
}

fn check_fields(snapshot: &Snapshot, report: &mut ValidationReport) {
    for position in snapshot.iter() {
        let name = position.name();

        if position.employee_count().is_none() {
            report.missing.push(format!("{name}: employee count"));
        }
        if position.education_requirements().is_none() {
            report
                .warnings
                .push(format!("{name}: education requirements are not specified"));
        }
        if position.responsibilities().is_empty() {
            report
                .warnings
                .push(format!("{name}: no responsibilities listed"));
        }
        for (index, _) in position
            .responsibilities()
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_empty())
        {
            report
                .warnings
                .push(format!("{name}: responsibility #{} is empty", index + 1));
        }
    }
}
