//! Decomposition of a literate Python module into blocks, using tree-sitter.
//!
//! Every top-level statement lands in exactly one place:
//! - metadata assignments are dropped (they become post attributes instead)
//! - bare string statements are docstrings, split into narrative and examples
//! - everything else is copied verbatim into a code listing

use crate::literal;
use crate::AdapterError;
use litpost_core::metadata::Attributes;
use litpost_core::{parse_examples, Block, BlockBuilder, Fragment};
use tracing::{debug, warn};
use tree_sitter::{Node, Parser, Tree};

/// Python decomposer using tree-sitter
pub struct PythonDecomposer {
    parser: std::sync::Mutex<Parser>,
}

/// Classification of one top-level statement
#[derive(Debug)]
enum TopLevel<'tree> {
    Metadata { name: String, value: Node<'tree> },
    Docstring(String),
    Code { first_row: usize, last_row: usize },
}

impl PythonDecomposer {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .expect("Failed to set Python language for parser");
        Self {
            parser: std::sync::Mutex::new(parser),
        }
    }

    /// Parse a module, rejecting sources with syntax errors.
    fn parse(&self, source: &str) -> Result<Tree, AdapterError> {
        let mut parser = self.parser.lock().map_err(|e| {
            AdapterError::ParseError(format!("Failed to acquire parser lock: {}", e))
        })?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| AdapterError::ParseError("Failed to parse source".to_string()))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error(root).unwrap_or(root).start_position().row + 1;
            return Err(AdapterError::Syntax { line });
        }
        Ok(tree)
    }

    /// Split a module into narrative, example-group and listing blocks.
    pub fn decompose(
        &self,
        source: &str,
        metadata_names: &[String],
    ) -> Result<Vec<Block>, AdapterError> {
        let tree = self.parse(source)?;
        let source_bytes = source.as_bytes();
        let lines: Vec<&str> = source.lines().collect();
        let statements = top_level_statements(tree.root_node());
        let spans: Vec<(usize, usize)> = statements
            .iter()
            .map(|node| (node.start_position().row, last_row(*node)))
            .collect();
        let mut builder = BlockBuilder::new();
        // Code not yet pushed, with the row it ends on. Statements joined by
        // `;` extend it on the same line.
        let mut pending: Option<(String, usize)> = None;

        for (index, statement) in statements.iter().enumerate() {
            match classify(*statement, source_bytes, metadata_names) {
                TopLevel::Metadata { name, .. } => {
                    debug!("Skipping metadata assignment `{}`", name);
                }
                TopLevel::Docstring(text) => {
                    flush_code(&mut builder, &mut pending);
                    for fragment in parse_examples(&text) {
                        match fragment {
                            Fragment::Example(example) => builder.push_example(example),
                            Fragment::Text(text) => builder.push_text(&text),
                        }
                    }
                }
                TopLevel::Code {
                    first_row,
                    last_row,
                } => {
                    let shares_row = spans.iter().enumerate().any(|(other, &(start, end))| {
                        other != index && start <= last_row && first_row <= end
                    });
                    let code = if shares_row {
                        node_text(*statement, source_bytes).unwrap_or_default()
                    } else {
                        let end = (last_row + 1).min(lines.len());
                        let start = first_row.min(end);
                        lines[start..end].join("\n")
                    };
                    let code = code.trim();

                    match pending.as_mut() {
                        Some((text, row)) if *row == first_row => {
                            text.push_str("; ");
                            text.push_str(code);
                            *row = last_row;
                        }
                        _ => {
                            flush_code(&mut builder, &mut pending);
                            pending = Some((code.to_string(), last_row));
                        }
                    }
                }
            }
        }
        flush_code(&mut builder, &mut pending);

        debug!("Decomposed module into {} blocks", builder.len());
        Ok(builder.finish())
    }

    /// Evaluate the metadata assignments of a module without running it.
    ///
    /// Later assignments to the same name win. Assignments whose right-hand
    /// side is not a literal are skipped with a warning.
    pub fn metadata_literals(
        &self,
        source: &str,
        metadata_names: &[String],
    ) -> Result<Attributes, AdapterError> {
        let tree = self.parse(source)?;
        let source_bytes = source.as_bytes();
        let mut attributes = Attributes::new();

        for statement in top_level_statements(tree.root_node()) {
            if let TopLevel::Metadata { name, value } =
                classify(statement, source_bytes, metadata_names)
            {
                match literal::literal_value(value, source_bytes) {
                    Some(v) => {
                        attributes.insert(name, v);
                    }
                    None => warn!(
                        line = value.start_position().row + 1,
                        "Attribute `{}` is not a literal; ignoring it", name
                    ),
                }
            }
        }

        Ok(attributes)
    }
}

impl Default for PythonDecomposer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience wrapper building a one-off [`PythonDecomposer`]
pub fn decompose(source: &str, metadata_names: &[String]) -> Result<Vec<Block>, AdapterError> {
    PythonDecomposer::new().decompose(source, metadata_names)
}

fn flush_code(builder: &mut BlockBuilder, pending: &mut Option<(String, usize)>) {
    if let Some((code, _)) = pending.take() {
        builder.push_code(&code);
    }
}

fn top_level_statements(root: Node)-> Vec<Node> {
    let mut cursor = root.walk();
    root.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn classify<'tree>(node: Node<'tree>, source: &[u8], metadata_names: &[String]) -> TopLevel<'tree> {
    if node.kind() == "expression_statement" {
        let mut cursor = node.walk();
        let inner: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .collect();

        if let [only] = inner.as_slice() {
            match only.kind() {
                "assignment" if only.child_by_field_name("type").is_none() => {
                    let left = only.child_by_field_name("left");
                    let right = only.child_by_field_name("right");
                    if let (Some(left), Some(right)) = (left, right) {
                        if left.kind() == "identifier" {
                            if let Some(name) = node_text(left, source) {
                                if metadata_names.contains(&name) {
                                    return TopLevel::Metadata { name, value: right };
                                }
                            }
                        }
                    }
                }
                "string" | "concatenated_string" => {
                    if let Some(text) = literal::string_value(*only, source) {
                        return TopLevel::Docstring(text);
                    }
                }
                _ => {}
            }
        }
    }

    TopLevel::Code {
        first_row: node.start_position().row,
        last_row: last_row(node),
    }
}

/// The greatest start row of any node in the subtree.
fn last_row(node: Node) -> usize {
    let mut max = node.start_position().row;
    let mut cursor = node.walk();
    let mut pending = vec![node];
    while let Some(current) = pending.pop() {
        max = max.max(current.start_position().row);
        pending.extend(current.children(&mut cursor));
    }
    max
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn node_text(node: Node, source: &[u8]) -> Option<String> {
    std::str::from_utf8(&source[node.byte_range()])
        .ok()
        .map(|s| s.to_string())
}
