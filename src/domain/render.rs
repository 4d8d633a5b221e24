//! Rendering a hierarchy into numbered document blocks.
//!
//! The renderer does not produce any binary document format. It emits an
//! ordered list of [`Block`]s which a [`Sink`] turns into whatever the
//! caller needs.

use std::io;

use borsh::BorshSerialize;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{
    graph::BuildError,
    validate::{validate_snapshot, ValidationOptions, ValidationReport},
    Graph, Position, Snapshot,
};

/// One structural element of the rendered document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// A section or position heading.
    Heading {
        /// Nesting level, starting at 1.
        level: u8,
        /// Heading text.
        text: String,
    },
    /// The heading of one numbered clause.
    ArticleHeading {
        /// The article number.
        number: u32,
        /// Heading text.
        text: String,
    },
    /// A paragraph of running text.
    Paragraph {
        /// Paragraph text.
        text: String,
    },
    /// An unordered list.
    BulletList {
        /// List entries, in order.
        items: Vec<String>,
    },
}

/// Headings used by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Heading of the section listing all positions.
    pub summary_heading: String,
    /// Heading of the section describing each position.
    pub details_heading: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            summary_heading: "Positions".to_string(),
            details_heading: "Position details".to_string(),
        }
    }
}

/// Errors that can occur when rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Rendering was requested for an unvalidated hierarchy that does not
    /// pass validation.
    #[error("the hierarchy has {} validation error(s)", .0.errors.len())]
    Invalid(ValidationReport),

    /// The graph could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// The rendered document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    /// The blocks, in document order.
    pub blocks: Vec<Block>,
    /// The first article number not used by this body. Pass it as the base
    /// of the next section to keep numbering continuous.
    pub next_article: u32,
}

impl Rendered {
    /// A SHA-256 digest of the blocks.
    ///
    /// Two renders of the same snapshot with the same base article always
    /// share a fingerprint.
    ///
    /// # Panics
    ///
    /// Panics if borsh serialization fails (which should never happen for
    /// in-memory data).
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let encoded = borsh::to_vec(&self.blocks).expect("this should never fail");
        format!("{:x}", Sha256::digest(encoded))
    }

    /// Feeds every block, in order, to a sink.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the sink.
    pub fn write_to<S: Sink>(&self, sink: &mut S) -> Result<(), S::Error> {
        self.blocks.iter().try_for_each(|block| sink.write_block(block))
    }
}

/// Consumer of rendered blocks, such as a document serializer.
pub trait Sink {
    /// The error type of the sink.
    type Error;

    /// Writes one block.
    ///
    /// # Errors
    ///
    /// Implementation-defined.
    fn write_block(&mut self, block: &Block) -> Result<(), Self::Error>;
}

/// Writes blocks as plain text.
#[derive(Debug)]
pub struct PlainTextSink<W> {
    writer: W,
}

impl<W: io::Write> PlainTextSink<W> {
    /// Creates a sink writing to `writer`.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write> Sink for PlainTextSink<W> {
    type Error = io::Error;

    fn write_block(&mut self, block: &Block) -> io::Result<()> {
        match block {
            Block::Heading { level: 1, text } => {
                writeln!(self.writer, "{}\n", text.to_uppercase())
            }
            Block::Heading { text, .. } => writeln!(self.writer, "{text}\n"),
            Block::ArticleHeading { text, .. } => writeln!(self.writer, "{text}"),
            Block::Paragraph { text } => writeln!(self.writer, "{text}\n"),
            Block::BulletList { items } => {
                for item in items {
                    writeln!(self.writer, "  - {item}")?;
                }
                writeln!(self.writer)
            }
        }
    }
}

/// Renders a snapshot into document blocks.
///
/// When `validated` is false the snapshot is validated first and rendering
/// is refused if validation reports errors. Article numbering starts at
/// `base_article` and advances once per emitted clause.
///
/// The document lists every position in a summary section and then
/// describes each one in a details section. Both sections follow the same
/// depth-first order (see [`Graph::walk`]), so names appear in the same
/// sequence and article numbers increase monotonically through the body.
///
/// # Errors
///
/// Returns [`RenderError::Invalid`] for an unvalidated snapshot with
/// validation errors, or [`RenderError::Build`] if the graph cannot be
/// built.
#[instrument(level = "debug", skip(snapshot, options), fields(positions = snapshot.len()))]
pub fn render(
    snapshot: &Snapshot,
    validated: bool,
    base_article: u32,
    options: &RenderOptions,
) -> Result<Rendered, RenderError> {
    if !validated {
        let report = validate_snapshot(snapshot, ValidationOptions::default());
        if !report.is_valid() {
            return Err(RenderError::Invalid(report));
        }
    }

    let graph = Graph::build(snapshot)?;
    let order: Vec<usize> = graph.walk().into_iter().map(|visit| visit.index).collect();

    let mut blocks = vec![
        Block::Heading {
            level: 1,
            text: options.summary_heading.clone(),
        },
        Block::BulletList {
            items: order
                .iter()
                .map(|&index| graph.position(index).name().to_string())
                .collect(),
        },
        Block::Heading {
            level: 1,
            text: options.details_heading.clone(),
        },
    ];

    let mut articles = Articles::new(base_article);
    for &index in &order {
        render_position(&graph, index, &mut articles, &mut blocks);
    }

    debug!(
        blocks = blocks.len(),
        next_article = articles.next,
        "rendered hierarchy"
    );

    Ok(Rendered {
        blocks,
        next_article: articles.next,
    })
}

/// Running article counter.
struct Articles {
    next: u32,
}

impl Articles {
    const fn new(base: u32) -> Self {
        Self { next: base }
    }

    fn clause(&mut self, blocks: &mut Vec<Block>, text: String, items: Option<Vec<String>>) {
        let number = self.next;
        self.next += 1;

        blocks.push(Block::ArticleHeading {
            number,
            text: format!("Article {number}"),
        });
        blocks.push(Block::Paragraph { text });
        if let Some(items) = items {
            blocks.push(Block::BulletList { items });
        }
    }
}

fn names(graph: &Graph, indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .map(|&index| graph.position(index).name().to_string())
        .collect()
}

fn render_position(graph: &Graph, index: usize, articles: &mut Articles, blocks: &mut Vec<Block>) {
    let position: &Position = graph.position(index);
    let name = position.name();

    blocks.push(Block::Heading {
        level: 2,
        text: name.to_string(),
    });

    let headcount = position.employee_count().map_or_else(
        || format!("The number of employees in the position of {name} is not specified."),
        |count| format!("The position of {name} is filled by {count} employee(s)."),
    );
    articles.clause(blocks, headcount, None);

    let conditions: Vec<String> = [
        ("Education", position.education_requirements()),
        ("Work experience", position.experience_requirements()),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|value| format!("{label}: {value}")))
    .collect();
    if !conditions.is_empty() {
        articles.clause(
            blocks,
            format!("Special conditions for the position of {name}:"),
            Some(conditions),
        );
    }

    let superiors = names(graph, &graph.superiors(index));
    let reporting = if superiors.is_empty() {
        format!("The position of {name} does not report to any other position.")
    } else {
        format!(
            "The position of {name} reports to: {}.",
            superiors.join(", ")
        )
    };
    articles.clause(blocks, reporting, None);

    let responsibilities: Vec<String> = position
        .responsibilities()
        .iter()
        .filter(|entry| !entry.is_empty())
        .cloned()
        .collect();
    if responsibilities.is_empty() {
        articles.clause(
            blocks,
            format!("No responsibilities are defined for the position of {name}."),
            None,
        );
    } else {
        articles.clause(
            blocks,
            format!("The responsibilities of the position of {name} are:"),
            Some(responsibilities),
        );
    }

    let subordinates = graph.subordinates(index);
    if !subordinates.is_empty() {
        articles.clause(
            blocks,
            format!("The following positions report to the position of {name}:"),
            Some(names(graph, &subordinates)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PositionInput;

    fn scenario() -> Snapshot {
        Snapshot::load(vec![
            PositionInput::named("CEO"),
            PositionInput::named("CFO").reporting_to("CEO"),
            PositionInput::named("Accountant").reporting_to("CFO"),
        ])
        .unwrap()
    }

    fn articles(rendered: &Rendered) -> Vec<u32> {
        rendered
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::ArticleHeading { number, .. } => Some(*number),
                _ => None,
            })
            .collect()
    }

    fn position_headings(rendered: &Rendered) -> Vec<&str> {
        rendered
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading { level: 2, text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn renders_positions_in_hierarchy_order() {
        let rendered = render(&scenario(), false, 1, &RenderOptions::default()).unwrap();

        assert_eq!(position_headings(&rendered), ["CEO", "CFO", "Accountant"]);
        assert_eq!(
            rendered.blocks[1],
            Block::BulletList {
                items: vec![
                    "CEO".to_string(),
                    "CFO".to_string(),
                    "Accountant".to_string()
                ],
            }
        );
    }

    #[test]
    fn article_numbers_advance_once_per_clause() {
        let rendered = render(&scenario(), true, 10, &RenderOptions::default()).unwrap();

        // CEO and CFO have a subordinates clause, the accountant does not,
        // and nobody has special conditions.
        assert_eq!(articles(&rendered), (10..=20).collect::<Vec<_>>());
        assert_eq!(rendered.next_article, 21);
    }

    #[test]
    fn optional_clauses_do_not_leave_gaps() {
        let snapshot = Snapshot::load(vec![
            PositionInput {
                education_requirements: Some("MBA".to_string()),
                ..PositionInput::named("CEO")
            },
            PositionInput::named("Clerk").reporting_to("CEO"),
        ])
        .unwrap();

        let rendered = render(&snapshot, true, 1, &RenderOptions::default()).unwrap();

        // CEO: headcount, conditions, reporting, responsibilities, subordinates
        // Clerk: headcount, reporting, responsibilities
        assert_eq!(articles(&rendered), (1..=8).collect::<Vec<_>>());
        assert!(rendered.blocks.contains(&Block::BulletList {
            items: vec!["Education: MBA".to_string()],
        }));
    }

    #[test]
    fn rendering_is_idempotent() {
        let snapshot = scenario();
        let options = RenderOptions::default();

        let first = render(&snapshot, true, 1, &options).unwrap();
        let second = render(&snapshot, true, 1, &options).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn counter_threads_between_sections() {
        let snapshot = scenario();
        let options = RenderOptions::default();

        let first = render(&snapshot, true, 1, &options).unwrap();
        let second = render(&snapshot, true, first.next_article, &options).unwrap();

        assert_eq!(articles(&second)[0], first.next_article);
        assert_ne!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn unvalidated_invalid_snapshot_is_refused() {
        let snapshot = Snapshot::load(vec![
            PositionInput::named("A").reporting_to("B"),
            PositionInput::named("B").reporting_to("A"),
        ])
        .unwrap();

        let err = render(&snapshot, false, 1, &RenderOptions::default()).unwrap_err();
        match err {
            RenderError::Invalid(report) => assert_eq!(report.errors.len(), 1),
            other @ RenderError::Build(_) => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn responsibilities_skip_blank_entries() {
        let snapshot = Snapshot::load(vec![PositionInput {
            responsibilities: vec!["Approve budgets".to_string(), " ".to_string()],
            ..PositionInput::named("CFO")
        }])
        .unwrap();

        let rendered = render(&snapshot, true, 1, &RenderOptions::default()).unwrap();
        assert!(rendered.blocks.contains(&Block::BulletList {
            items: vec!["Approve budgets".to_string()],
        }));
    }

    #[test]
    fn plain_text_sink_writes_blocks() {
        let rendered = Rendered {
            blocks: vec![
                Block::Heading {
                    level: 1,
                    text: "Positions".to_string(),
                },
                Block::ArticleHeading {
                    number: 1,
                    text: "Article 1".to_string(),
                },
                Block::Paragraph {
                    text: "Text.".to_string(),
                },
                Block::BulletList {
                    items: vec!["a".to_string(), "b".to_string()],
                },
            ],
            next_article: 2,
        };

        let mut sink = PlainTextSink::new(Vec::new());
        rendered.write_to(&mut sink).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "POSITIONS\n\nArticle 1\nText.\n\n  - a\n  - b\n\n");
    }

    #[test]
    fn blocks_serialize_with_kind_tag() {
        let block = Block::ArticleHeading {
            number: 3,
            text: "Article 3".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            serde_json::json!({"kind": "article_heading", "number": 3, "text": "Article 3"})
        );
    }
}
