//! Content blocks of a literate post and their reStructuredText rendering.

use crate::doctest::{Example, BLANKLINE_MARKER, PS1, PS2};
use serde::{Deserialize, Serialize};

/// Indentation applied to everything inside a directive body
pub const INDENT: &str = "   ";

/// Formatting options for [`Block::render`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Number the lines of code listings
    #[serde(default = "default_true")]
    pub use_line_numbers: bool,

    /// Emit `:noclasses:` (inline styles instead of CSS classes).
    /// `None` picks the per-kind default: listings keep classes,
    /// example sessions suppress them.
    #[serde(default)]
    pub suppress_style_classes: Option<bool>,

    /// Lexer name for code listings
    #[serde(default = "default_language")]
    pub language: String,

    /// Lexer name for interactive sessions
    #[serde(default = "default_interactive_language")]
    pub interactive_language: String,
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    String::from("python")
}

fn default_interactive_language() -> String {
    String::from("pycon")
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            use_line_numbers: true,
            suppress_style_classes: None,
            language: default_language(),
            interactive_language: default_interactive_language(),
        }
    }
}

/// The kind of a block, without its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Narrative,
    Examples,
    Listing,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Narrative => "narrative",
            BlockKind::Examples => "examples",
            BlockKind::Listing => "listing",
        }
    }
}

/// A run of consecutive interactive examples
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExampleGroup {
    pub examples: Vec<Example>,
}

impl ExampleGroup {
    pub fn new(example: Example) -> Self {
        Self {
            examples: vec![example],
        }
    }

    pub fn add(&mut self, example: Example) {
        self.examples.push(example);
    }

    pub fn render(&self, options: &RenderOptions) -> String {
        let mut lines = Vec::new();
        for example in &self.examples {
            for (i, line) in example.source.trim().lines().enumerate() {
                let prompt = if i == 0 { PS1 } else { PS2 };
                lines.push(format!("{} {}", prompt, line).trim_end().to_string());
            }
            if let Some(output) = example.output() {
                for line in output.trim_end().lines() {
                    if line.trim() == BLANKLINE_MARKER {
                        lines.push(String::new());
                    } else {
                        lines.push(line.to_string());
                    }
                }
            }
        }

        let mut out = directive_header(&options.interactive_language);
        if options.suppress_style_classes.unwrap_or(true) {
            out.push_str(INDENT);
            out.push_str(":noclasses:\n");
        }
        out.push('\n');
        push_indented(&mut out, lines.iter().map(String::as_str));
        out
    }
}

/// Verbatim source code accumulated from consecutive top-level statements
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Listing {
    code: String,
}

impl Listing {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    /// Append another statement, separated by a blank line.
    pub fn add(&mut self, code: &str) {
        self.code.push_str("\n\n");
        self.code.push_str(code);
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn render(&self, options: &RenderOptions) -> String {
        let mut out = directive_header(&options.language);
        if options.suppress_style_classes.unwrap_or(false) {
            out.push_str(INDENT);
            out.push_str(":noclasses:\n");
        }
        if options.use_line_numbers {
            out.push_str(INDENT);
            out.push_str(":linenos:\n");
        }
        out.push('\n');
        push_indented(&mut out, self.code.lines());
        out
    }
}

/// One unit of post content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "lowercase")]
pub enum Block {
    Narrative(String),
    Examples(ExampleGroup),
    Listing(Listing),
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Narrative(_) => BlockKind::Narrative,
            Block::Examples(_) => BlockKind::Examples,
            Block::Listing(_) => BlockKind::Listing,
        }
    }

    /// Examples held by this block (empty unless it is an example group)
    pub fn examples(&self) -> &[Example] {
        match self {
            Block::Examples(group) => &group.examples,
            _ => &[],
        }
    }

    pub fn examples_mut(&mut self) -> &mut [Example] {
        match self {
            Block::Examples(group) => &mut group.examples,
            _ => &mut [],
        }
    }

    pub fn render(&self, options: &RenderOptions) -> String {
        match self {
            Block::Narrative(text) => format!("{}\n", text),
            Block::Examples(group) => group.render(options),
            Block::Listing(listing) => listing.render(options),
        }
    }
}

/// Builds a block sequence, coalescing neighbours of the same kind.
///
/// Examples join a trailing example group and code joins a trailing listing.
/// Narrative text always starts a new block.
#[derive(Debug, Default)]
pub struct BlockBuilder {
    blocks: Vec<Block>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_example(&mut self, example: Example) {
        match self.blocks.last_mut() {
            Some(Block::Examples(group)) => group.add(example),
            _ => self.blocks.push(Block::Examples(ExampleGroup::new(example))),
        }
    }

    /// Add narrative text; blank text is ignored.
    pub fn push_text(&mut self, text: &str) {
        let text = text.trim();
        if !text.is_empty() {
            self.blocks.push(Block::Narrative(text.to_string()));
        }
    }

    pub fn push_code(&mut self, code: &str) {
        match self.blocks.last_mut() {
            Some(Block::Listing(listing)) => listing.add(code),
            _ => self.blocks.push(Block::Listing(Listing::new(code))),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn finish(self) -> Vec<Block> {
        self.blocks
    }
}

fn directive_header(language: &str) -> String {
    format!(".. sourcecode:: {}\n", language)
}

fn push_indented<'a>(out: &mut String, lines: impl Iterator<Item = &'a str>) {
    for line in lines {
        if !line.is_empty() {
            out.push_str(INDENT);
            out.push_str(line);
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> RenderOptions {
        RenderOptions::default()
    }

    #[test]
    fn test_narrative_render() {
        let block = Block::Narrative("Welcome.".to_string());
        assert_eq!(block.render(&plain()), "Welcome.\n");
    }

    #[test]
    fn test_listing_render_default() {
        let listing = Listing::new("def f():\n    return 1");
        assert_eq!(
            listing.render(&plain()),
            ".. sourcecode:: python\n   :linenos:\n\n   def f():\n       return 1\n"
        );
    }

    #[test]
    fn test_listing_render_options() {
        let listing = Listing::new("x = 1");
        let options = RenderOptions {
            use_line_numbers: false,
            suppress_style_classes: Some(true),
            ..RenderOptions::default()
        };
        assert_eq!(
            listing.render(&options),
            ".. sourcecode:: python\n   :noclasses:\n\n   x = 1\n"
        );
    }

    #[test]
    fn test_listing_add_joins_with_blank_line() {
        let mut listing = Listing::new("def a():\n    pass");
        listing.add("def b():\n    pass");
        assert_eq!(listing.code(), "def a():\n    pass\n\ndef b():\n    pass");
        assert!(listing.render(&plain()).contains("       pass\n\n   def b():\n"));
    }

    #[test]
    fn test_example_group_render() {
        let mut group = ExampleGroup::new(Example::new("1+1", "2"));
        group.add(Example::new("x = 5", ""));
        group.add(Example::new("for i in range(2):\n    print(i)\n", "0\n1\n"));

        assert_eq!(
            group.render(&plain()),
            ".. sourcecode:: pycon\n   :noclasses:\n\n   >>> 1+1\n   2\n   >>> x = 5\n   >>> for i in range(2):\n   ...     print(i)\n   0\n   1\n"
        );
    }

    #[test]
    fn test_example_group_keeps_classes_when_asked() {
        let group = ExampleGroup::new(Example::new("1", "1"));
        let options = RenderOptions {
            suppress_style_classes: Some(false),
            ..RenderOptions::default()
        };
        assert_eq!(
            group.render(&options),
            ".. sourcecode:: pycon\n\n   >>> 1\n   1\n"
        );
    }

    #[test]
    fn test_actual_output_wins() {
        let mut example = Example::new("1+1", "2");
        example.actual = Some("11\n".to_string());
        let rendered = ExampleGroup::new(example).render(&plain());
        assert!(rendered.contains("   11\n"));
        assert!(!rendered.contains("   2\n"));
    }

    #[test]
    fn test_blankline_marker_collapsed() {
        let group = ExampleGroup::new(Example::new("print('a\\n\\nb')", "a\n<BLANKLINE>\nb"));
        assert!(group.render(&plain()).ends_with("   a\n\n   b\n"));
    }

    #[test]
    fn test_builder_merges_same_kind() {
        let mut builder = BlockBuilder::new();
        builder.push_code("import os");
        builder.push_code("import sys");
        builder.push_text("Some prose.");
        builder.push_example(Example::new("1", "1"));
        builder.push_example(Example::new("2", "2"));
        builder.push_text("   ");
        builder.push_code("x = 1");

        let blocks = builder.finish();
        let kinds: Vec<_> = blocks.iter().map(Block::kind).collect();
        assert_eq!(
            kinds,
            vec![BlockKind::Listing, BlockKind::Narrative, BlockKind::Examples, BlockKind::Listing]
        );
        match &blocks[0] {
            Block::Listing(l) => assert_eq!(l.code(), "import os\n\nimport sys"),
            other => panic!("expected listing, got {:?}", other),
        }
        match &blocks[2] {
            Block::Examples(g) => assert_eq!(g.examples.len(), 2),
            other => panic!("expected examples, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_never_merges_narrative() {
        let mut builder = BlockBuilder::new();
        builder.push_text("First.");
        builder.push_text("Second.");
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_block_kind_as_str() {
        assert_eq!(BlockKind::Examples.as_str(), "examples");
        assert_eq!(Block::Listing(Listing::new("x")).kind().as_str(), "listing");
    }
}
