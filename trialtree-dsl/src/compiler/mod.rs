//! Schedule compiler - turn an AST into weighted trial sequences
//!
//! # Pipeline
//!
//! ```text
//! ScheduleAst → construct → EventTree → normalize → enumerate → allocate → Schedule
//!                   ↓                                                          ↑
//!                  ITI ─────────────────────────────────────────────────────────┘
//! ```

pub mod allocate;
pub mod construct;
pub mod leaves;
pub mod normalize;

pub use allocate::*;
pub use construct::*;
pub use leaves::*;
pub use normalize::*;

use crate::ast::{build, BuildError, ScheduleAst};
use crate::parser::{parse, ParseError};
use thiserror::Error;
use trialtree_core::{
    CompileOptions, ConfigError, NodeId, Schedule, ScheduledSequence, TreeError,
};

// ============================================================================
// COMPILE ERRORS
// ============================================================================

/// Errors that end a compilation. No partial schedule is produced.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Explicit sibling proportions add up to more than 1
    #[error("explicit proportions below node {node} ('{label}') sum to {sum}, more than 1")]
    NormalizationInconsistency { node: NodeId, label: String, sum: f64 },

    #[error("found {count} inter-trial intervals, at most one is allowed")]
    DuplicateIti { count: usize },
}

pub type CompileResult<T> = Result<T, CompileError>;

// ============================================================================
// COMPILER
// ============================================================================

/// Runs the full pipeline with one set of options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleCompiler {
    options: CompileOptions,
}

impl ScheduleCompiler {
    pub fn new(options: CompileOptions) -> CompileResult<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Parse, build and compile DSL source.
    pub fn compile(&self, source: &str) -> CompileResult<Schedule> {
        let cst = parse(source)?;
        let ast = build(&cst)?;
        self.compile_ast(&ast)
    }

    /// Compile an already built AST.
    pub fn compile_ast(&self, ast: &ScheduleAst) -> CompileResult<Schedule> {
        let ConstructedTree { mut tree, iti } = construct(ast)?;
        normalize(&mut tree, &self.options)?;

        let sequences = enumerate(&tree);
        let proportions: Vec<f64> = sequences.iter().map(|s| s.proportion).collect();
        let allocation = allocate(&proportions, ast.total_trials, self.options.remainder_policy);

        if allocation.remainder > 0 {
            tracing::info!(
                remainder = allocation.remainder,
                total_trials = ast.total_trials,
                policy = ?self.options.remainder_policy,
                "Trials left unallocated"
            );
        }

        let sequences = sequences
            .into_iter()
            .zip(allocation.counts)
            .map(|(sequence, n)| ScheduledSequence { sequence, n })
            .collect();

        Ok(Schedule {
            total_duration: ast.total_duration,
            total_trials: ast.total_trials,
            iti,
            sequences,
            remainder: allocation.remainder,
        })
    }
}

/// Compile DSL source with default options.
pub fn compile(source: &str) -> CompileResult<Schedule> {
    ScheduleCompiler::default().compile(source)
}

/// Compile DSL source with the given options.
pub fn compile_with(source: &str, options: &CompileOptions) -> CompileResult<Schedule> {
    ScheduleCompiler::new(options.clone())?.compile(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::MAX_NESTING;
    use trialtree_core::{ProportionPolicy, RemainderPolicy};

    #[test]
    fn test_compile_single_event() {
        let schedule = compile("100/10x test").unwrap();
        assert_eq!(schedule.total_duration, 100.0);
        assert_eq!(schedule.total_trials, 10);
        assert_eq!(schedule.sequences.len(), 1);
        let only = &schedule.sequences[0];
        assert_eq!(only.sequence.names(), vec!["test"]);
        assert_eq!(only.sequence.proportion, 1.0);
        assert_eq!(only.sequence.duration, 1.0);
        assert_eq!(only.n, 10);
        assert_eq!(schedule.remainder, 0);
    }

    #[test]
    fn test_parse_error_surfaces() {
        let err = compile("100/10x").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
        assert!(err.to_string().starts_with("Parse error"));
    }

    #[test]
    fn test_build_error_surfaces() {
        let err = compile("100/10x 2*A").unwrap_err();
        assert!(matches!(err, CompileError::Build(BuildError::InvalidValue { .. })));
    }

    #[test]
    fn test_strict_and_lenient_policies() {
        let source = "100/10x {.7*A,.6*B}";
        let err = compile(source).unwrap_err();
        assert!(matches!(err, CompileError::NormalizationInconsistency { .. }));
        assert!(err.to_string().contains("more than 1"));

        let schedule = compile_with(source, &CompileOptions::lenient()).unwrap();
        assert_eq!(schedule.allocated() + schedule.remainder, 10);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = CompileOptions {
            proportion_policy: ProportionPolicy::Strict,
            remainder_policy: RemainderPolicy::Report,
            tolerance: f64::NAN,
        };
        let err = compile_with("100/10x A", &options).unwrap_err();
        assert!(matches!(err, CompileError::Config(_)));
    }

    #[test]
    fn test_remainder_policy_applied() {
        let source = "100/10x A=1.5,{.15*B=.5,C=.3,$},D";
        let report = compile(source).unwrap();
        assert_eq!(report.remainder, 1);

        let options = CompileOptions::default().with_remainder_policy(RemainderPolicy::LargestRemainder);
        let compiler = ScheduleCompiler::new(options).unwrap();
        let spread = compiler.compile(source).unwrap();
        assert_eq!(spread.remainder, 0);
        assert_eq!(spread.allocated(), 10);
    }

    #[test]
    fn test_nesting_limit_compiles_and_beyond_errors() -> Result<(), CompileError> {
        let nested = |depth: usize| format!("100/10x {}A{}", "{".repeat(depth), "}".repeat(depth));

        let schedule = compile(&nested(MAX_NESTING))?;
        assert_eq!(schedule.sequences.len(), 1);
        assert_eq!(schedule.sequences[0].sequence.names(), vec!["A"]);
        assert_eq!(schedule.sequences[0].n, 10);

        let err = compile(&nested(MAX_NESTING * 50)).unwrap_err();
        assert!(matches!(err, CompileError::Parse(ref e) if e.offset == 8 + MAX_NESTING));
        Ok(())
    }

    #[test]
    fn test_nested_iti_is_build_error() {
        let err = compile("100/10x {A,;=1}").unwrap_err();
        assert_eq!(err, CompileError::Build(BuildError::NestedIti { offset: 11 }));
    }

    #[test]
    fn test_iti_carried_into_schedule() {
        let schedule = compile("100/10x A;=2.5").unwrap();
        assert_eq!(schedule.iti.and_then(|i| i.duration), Some(2.5));
    }
}
