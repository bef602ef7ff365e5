use serde::{Deserialize, Serialize};

/// Where opening braces go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BraceStyle {
    /// `if(a) {`
    SameLine,
    /// `if(a)` then `{` on its own line.
    #[default]
    NextLine,
}

/// Output formatting chosen by the embedding printer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompileOptions {
    pub brace_style: BraceStyle,
    /// One indentation unit.
    pub indent: String,
    /// Drop informational comments; error diagnostics are always kept.
    pub suppress_comments: bool,
    /// Omit the compiler-generated trailing `return;`.
    pub suppress_implicit_return: bool,
    /// Indent level of the first line.
    pub initial_indent: usize,
}

impl Default for DecompileOptions {
    fn default() -> Self {
        Self {
            brace_style: BraceStyle::NextLine,
            indent: "\t".into(),
            suppress_comments: false,
            suppress_implicit_return: true,
            initial_indent: 0,
        }
    }
}

/// Mutable state threaded through one decompile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompileContext {
    pub options: DecompileOptions,
    pub indent: usize,
    /// Indent change applied before the next emitted line.
    pub pending_indent_delta: isize,
    /// Comment emitted on its own line before the current statement.
    pub pre_comment: Option<String>,
    /// Comment appended to the current statement.
    pub post_comment: Option<String>,
    /// The statement being rendered ends with `;`.
    pub needs_terminator: bool,
    /// Calls render with a `static.` prefix.
    pub in_class_static_context: bool,
    /// Rendering the member side of a context expression.
    pub in_context: bool,
}

impl DecompileContext {
    pub fn new(options: DecompileOptions) -> Self {
        Self {
            indent: options.initial_indent,
            options,
            pending_indent_delta: 0,
            pre_comment: None,
            post_comment: None,
            needs_terminator: false,
            in_class_static_context: false,
            in_context: false,
        }
    }

    /// Back to the state of a fresh context with the same options.
    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.options));
    }

    /// Fold any pending delta into the indent level.
    pub fn apply_pending_indent(&mut self) {
        let level = self.indent as isize + self.pending_indent_delta;
        self.indent = level.max(0) as usize;
        self.pending_indent_delta = 0;
    }

    pub fn pad(&self) -> String {
        self.options.indent.repeat(self.indent)
    }

    /// Padding one level out, used for labels.
    pub fn outdented_pad(&self) -> String {
        self.options.indent.repeat(self.indent.saturating_sub(1))
    }
}

impl Default for DecompileContext {
    fn default() -> Self {
        Self::new(DecompileOptions::default())
    }
}
