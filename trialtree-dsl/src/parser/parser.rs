//! Parser implementation
//!
//! Recursive-descent recognizer for the schedule grammar with PEG semantics:
//! alternatives are tried in order, optionals are greedy, and a failed rule
//! rewinds the cursor to where it started. The furthest failure seen is what
//! gets reported when the input as a whole does not match. Groups nest at
//! most [`MAX_NESTING`] deep.
//!
//! ```text
//! main        = info anyevent+
//! info        = total_dur "/" total_trials "x" " "
//! anyevent    = children | event | catch_end | iti
//! children    = "{" anyevent+ "}" maxrep? sep?
//! catch_end   = "$"
//! event       = reps? prop? name dur? maxrep? sep?
//! iti         = ";" dur?
//! name        = [A-Za-z0-9.:_-]+
//! reps        = integer "x"
//! prop        = float "*"
//! dur         = "=" float dur_range? dur_type?
//! dur_range   = "..." float
//! dur_type    = "(exp)"
//! maxrep      = "<" integer ">"
//! sep         = ","
//! float       = [0-9.]+
//! integer     = [0-9]+
//! ```

use super::cst::*;
use super::cursor::{Checkpoint, Cursor};
use serde::{Deserialize, Serialize};

const RANGE_SEPARATOR: &str = "...";

/// Deepest `{...}` nesting accepted. Every later pass recurses once per
/// level, so the bound keeps all of them off the end of the stack.
pub const MAX_NESTING: usize = 64;

const NESTING_EXPECTED: &str = "at most 64 nested groups";

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Parse error with offset and line/column information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    /// What the grammar would have accepted at `offset`
    pub expected: String,
    /// Byte offset into the source
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {} (offset {}): {}, expected {}",
            self.line, self.column, self.offset, self.message, self.expected
        )
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// PARSER
// ============================================================================

/// Parser for the schedule DSL.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    furthest: Checkpoint,
    expected: Vec<&'static str>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let cursor = Cursor::new(source);
        let furthest = cursor.checkpoint();
        Self {
            cursor,
            furthest,
            expected: Vec::new(),
            depth: 0,
        }
    }

    /// Parse the whole source into a `Main` node.
    pub fn parse(&mut self) -> Result<ParseNode, ParseError> {
        let start = self.cursor.checkpoint();

        let info = self.info().ok_or_else(|| self.error())?;
        let mut children = vec![info];
        while let Some(item) = self.any_event() {
            children.push(item);
        }
        if children.len() == 1 {
            return Err(self.error());
        }

        let span = self.cursor.span_from(start);
        let text = self.cursor.slice_from(start);

        // A single line terminator may close the line.
        if !self.cursor.eat("\r\n") {
            self.cursor.eat("\n");
        }
        if !self.cursor.is_at_end() {
            self.note("end of input");
            return Err(self.error());
        }

        Ok(ParseNode::new(Rule::Main, span, text).with_children(children))
    }

    // ========================================================================
    // Productions
    // ========================================================================

    fn info(&mut self) -> Option<ParseNode> {
        self.sequence(Rule::Info, |p| {
            let total_dur = p.sequence(Rule::TotalDur, |p| Some(vec![p.float()?]))?;
            let slash = p.literal("/", "`/`")?;
            let total_trials = p.sequence(Rule::TotalTrials, |p| Some(vec![p.integer()?]))?;
            let x = p.literal("x", "`x`")?;
            let space = p.literal(" ", "a space")?;
            Some(vec![total_dur, slash, total_trials, x, space])
        })
    }

    fn any_event(&mut self) -> Option<ParseNode> {
        self.children()
            .or_else(|| self.event())
            .or_else(|| self.catch_end())
            .or_else(|| self.iti())
    }

    fn children(&mut self) -> Option<ParseNode> {
        if self.depth >= MAX_NESTING {
            if self.cursor.starts_with("{") {
                self.note(NESTING_EXPECTED);
            }
            return None;
        }

        self.depth += 1;
        let group = self.sequence(Rule::Children, |p| {
            let mut nodes = vec![p.literal("{", "`{`")?];
            nodes.push(p.any_event()?);
            while let Some(member) = p.any_event() {
                nodes.push(member);
            }
            nodes.push(p.literal("}", "`}`")?);
            nodes.extend(p.max_rep());
            nodes.extend(p.sep());
            Some(nodes)
        });
        self.depth -= 1;
        group
    }

    fn catch_end(&mut self) -> Option<ParseNode> {
        self.sequence(Rule::CatchEnd, |p| p.literal("$", "`$`").map(|_| Vec::new()))
    }

    fn event(&mut self) -> Option<ParseNode> {
        self.sequence(Rule::Event, |p| {
            let mut nodes = Vec::new();
            nodes.extend(p.reps());
            nodes.extend(p.prop());
            nodes.push(p.name()?);
            nodes.extend(p.dur());
            nodes.extend(p.max_rep());
            nodes.extend(p.sep());
            Some(nodes)
        })
    }

    fn iti(&mut self) -> Option<ParseNode> {
        self.sequence(Rule::Iti, |p| {
            let mut nodes = vec![p.literal(";", "`;`")?];
            nodes.extend(p.dur());
            Some(nodes)
        })
    }

    fn name(&mut self) -> Option<ParseNode> {
        let start = self.cursor.checkpoint();
        if self.cursor.eat_while(|_, c| is_name_char(c)) == 0 {
            self.note("name");
            return None;
        }
        Some(self.leaf(Rule::Name, start))
    }

    fn reps(&mut self) -> Option<ParseNode> {
        self.sequence(Rule::Reps, |p| {
            Some(vec![p.integer()?, p.literal("x", "`x`")?])
        })
    }

    fn prop(&mut self) -> Option<ParseNode> {
        self.sequence(Rule::Prop, |p| Some(vec![p.float()?, p.literal("*", "`*`")?]))
    }

    fn dur(&mut self) -> Option<ParseNode> {
        self.sequence(Rule::Dur, |p| {
            let mut nodes = vec![p.literal("=", "`=`")?, p.float()?];
            nodes.extend(p.dur_range());
            nodes.extend(p.dur_type());
            Some(nodes)
        })
    }

    fn dur_range(&mut self) -> Option<ParseNode> {
        self.sequence(Rule::DurRange, |p| {
            Some(vec![p.literal(RANGE_SEPARATOR, "`...`")?, p.float()?])
        })
    }

    fn dur_type(&mut self) -> Option<ParseNode> {
        self.sequence(Rule::DurType, |p| Some(vec![p.literal("(exp)", "`(exp)`")?]))
    }

    fn max_rep(&mut self) -> Option<ParseNode> {
        self.sequence(Rule::MaxRep, |p| {
            Some(vec![
                p.literal("<", "`<`")?,
                p.integer()?,
                p.literal(">", "`>`")?,
            ])
        })
    }

    fn sep(&mut self) -> Option<ParseNode> {
        self.sequence(Rule::Sep, |p| p.literal(",", "`,`").map(|_| Vec::new()))
    }

    /// `[0-9.]+`, stopping in front of a `...` range separator. The text
    /// must read as a finite number.
    fn float(&mut self) -> Option<ParseNode> {
        let start = self.cursor.checkpoint();
        let taken = self.cursor.eat_while(|cursor, c| {
            (c.is_ascii_digit() || c == '.') && !cursor.starts_with(RANGE_SEPARATOR)
        });
        let value = self.cursor.slice_from(start).parse::<f64>();
        if taken == 0 || !value.map(f64::is_finite).unwrap_or(false) {
            self.cursor.restore(start);
            self.note("number");
            return None;
        }
        Some(self.leaf(Rule::Float, start))
    }

    fn integer(&mut self) -> Option<ParseNode> {
        let start = self.cursor.checkpoint();
        let taken = self.cursor.eat_while(|_, c| c.is_ascii_digit());
        if taken == 0 || self.cursor.slice_from(start).parse::<u64>().is_err() {
            self.cursor.restore(start);
            self.note("integer");
            return None;
        }
        Some(self.leaf(Rule::Integer, start))
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    /// Run `body` as one production; rewind if it does not match.
    fn sequence(
        &mut self,
        rule: Rule,
        body: impl FnOnce(&mut Self) -> Option<Vec<ParseNode>>,
    ) -> Option<ParseNode> {
        let start = self.cursor.checkpoint();
        match body(self) {
            Some(children) => Some(self.leaf(rule, start).with_children(children)),
            None => {
                self.cursor.restore(start);
                None
            }
        }
    }

    fn literal(&mut self, literal: &'static str, expected: &'static str) -> Option<ParseNode> {
        let start = self.cursor.checkpoint();
        if self.cursor.eat(literal) {
            Some(self.leaf(Rule::Literal, start))
        } else {
            self.note(expected);
            None
        }
    }

    fn leaf(&self, rule: Rule, start: Checkpoint) -> ParseNode {
        ParseNode::new(rule, self.cursor.span_from(start), self.cursor.slice_from(start))
    }

    /// Record that `expected` would have matched at the current position.
    fn note(&mut self, expected: &'static str) {
        let pos = self.cursor.pos();
        if pos > self.furthest.offset() {
            self.furthest = self.cursor.checkpoint();
            self.expected.clear();
        }
        if pos == self.furthest.offset() && !self.expected.contains(&expected) {
            self.expected.push(expected);
        }
    }

    fn error(&self) -> ParseError {
        let offset = self.furthest.offset();
        let mut probe = Cursor::new(self.cursor.source());
        while probe.pos() < offset && probe.advance().is_some() {}
        let at = probe.checkpoint();
        let message = match probe.peek_char() {
            Some(c) => format!("unexpected '{}'", c.escape_default()),
            None => "unexpected end of input".to_string(),
        };
        let expected = match self.expected.as_slice() {
            [] => "a schedule".to_string(),
            [only] => only.to_string(),
            many => format!("one of {}", many.join(", ")),
        };
        let span = probe.span_from(at);
        ParseError {
            message,
            expected,
            offset,
            line: span.line,
            column: span.column,
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '_' | '-')
}

/// Parse DSL source into a concrete syntax tree.
pub fn parse(source: &str) -> Result<ParseNode, ParseError> {
    Parser::new(source).parse()
}

// ============================================================================
// TESTS
// ============================================================================
