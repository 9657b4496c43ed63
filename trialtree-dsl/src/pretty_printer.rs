//! Pretty printer for schedule ASTs
//!
//! Prints canonical DSL text: every event carries an explicit duration and
//! numbers use their shortest round-tripping form. Parsing the output yields
//! the same AST.

use crate::ast::{build, Group, Item, ScheduleAst};
use crate::compiler::CompileResult;
use crate::parser::parse;
use trialtree_core::{DurationKind, Event, Iti};

/// Render `ast` as DSL source.
pub fn pretty_print(ast: &ScheduleAst) -> String {
    let mut out = format!("{}/{}x ", ast.total_duration, ast.total_trials);
    print_items(&ast.items, &mut out);
    out
}

/// Parse `source` and print it back in canonical form.
pub fn round_trip(source: &str) -> CompileResult<String> {
    let ast = build(&parse(source)?)?;
    Ok(pretty_print(&ast))
}

fn print_items(items: &[Item], out: &mut String) {
    let mut after_timed_iti = false;
    for (i, item) in items.iter().enumerate() {
        let last = i + 1 == items.len();
        match item {
            Item::Event(event) if event.is_catch_end() => out.push('$'),
            Item::Event(event) => {
                let mut text = String::new();
                print_event(event, &mut text);
                // `;=1` followed by `2xA` would read as `;=12`; a group of
                // one keeps them apart and collapses back when parsed.
                if after_timed_iti && text.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
                    out.push_str(&format!("{{{}}}", text));
                } else {
                    out.push_str(&text);
                }
                separator(last, out);
            }
            Item::Group(group) => {
                print_group(group, out);
                separator(last, out);
            }
            Item::Iti(iti) => print_iti(iti, out),
        }
        after_timed_iti = matches!(item, Item::Iti(iti) if iti.duration.is_some());
    }
}

fn print_event(event: &Event, out: &mut String) {
    if let Some(reps) = event.repeat_count {
        out.push_str(&format!("{}x", reps));
    }
    if let Some(prop) = event.proportion {
        out.push_str(&format!("{}*", prop));
    }
    out.push_str(event.label());
    print_duration(event.duration, event.duration_range, event.duration_kind, out);
    print_max_repeat(event.max_repeat, out);
}

fn print_group(group: &Group, out: &mut String) {
    out.push('{');
    print_items(&group.members, out);
    out.push('}');
    print_max_repeat(group.max_repeat, out);
}

fn print_iti(iti: &Iti, out: &mut String) {
    out.push(';');
    if let Some(duration) = iti.duration {
        print_duration(duration, iti.duration_range, iti.duration_kind, out);
    }
}

fn print_duration(value: f64, range: Option<f64>, kind: DurationKind, out: &mut String) {
    out.push_str(&format!("={}", value));
    if let Some(upper) = range {
        out.push_str(&format!("...{}", upper));
    }
    if kind == DurationKind::Exponential {
        out.push_str("(exp)");
    }
}

fn print_max_repeat(max_repeat: Option<u32>, out: &mut String) {
    if let Some(max) = max_repeat {
        out.push_str(&format!("<{}>", max));
    }
}

fn separator(last: bool, out: &mut String) {
    if !last {
        out.push(',');
    }
}
