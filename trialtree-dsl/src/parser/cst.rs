//! Concrete syntax tree produced by the parser

use serde::{Deserialize, Serialize};

/// Source location span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// One variant per grammar production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    Main,
    Info,
    TotalDur,
    TotalTrials,
    Children,
    CatchEnd,
    Event,
    Iti,
    Name,
    Reps,
    Prop,
    Dur,
    DurRange,
    DurType,
    MaxRep,
    Sep,
    Float,
    Integer,
    /// Punctuation terminal such as `{`, `*` or `=`
    Literal,
}

impl Rule {
    /// Grammar name of the production.
    pub fn name(self) -> &'static str {
        match self {
            Rule::Main => "main",
            Rule::Info => "info",
            Rule::TotalDur => "total_dur",
            Rule::TotalTrials => "total_trials",
            Rule::Children => "children",
            Rule::CatchEnd => "catch_end",
            Rule::Event => "event",
            Rule::Iti => "iti",
            Rule::Name => "name",
            Rule::Reps => "reps",
            Rule::Prop => "prop",
            Rule::Dur => "dur",
            Rule::DurRange => "dur_range",
            Rule::DurType => "dur_type",
            Rule::MaxRep => "maxrep",
            Rule::Sep => "sep",
            Rule::Float => "float",
            Rule::Integer => "integer",
            Rule::Literal => "literal",
        }
    }
}

/// A matched production with the text it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseNode {
    pub rule: Rule,
    pub span: Span,
    pub text: String,
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    pub fn new(rule: Rule, span: Span, text: impl Into<String>) -> Self {
        Self {
            rule,
            span,
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<ParseNode>) -> Self {
        self.children = children;
        self
    }

    /// First direct child matching `rule`.
    pub fn child(&self, rule: Rule) -> Option<&ParseNode> {
        self.children.iter().find(|c| c.rule == rule)
    }
}
