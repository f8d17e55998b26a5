//! Terminal output for vox: narration, plan results and warnings.

use crossterm::style::{Attribute, Color, ResetColor, SetAttribute, SetForegroundColor};
use std::io::{self, Write};
use vox_core::{Narrator, PlanReport, RunOutcome};
use vox_planner::Plan;

/// Speaks by printing. Lines are prefixed with a bold cyan "vox:".
pub struct ConsoleNarrator;

impl Narrator for ConsoleNarrator {
    fn say(&self, line: &str) {
        println!(
            "{}{}vox:{}{} {}",
            SetAttribute(Attribute::Bold),
            SetForegroundColor(Color::Cyan),
            ResetColor,
            SetAttribute(Attribute::Reset),
            line
        );
        let _ = io::stdout().flush();
    }
}

pub fn print_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Cancelled => print_status("cancelled", Color::Yellow),
        // Already narrated
        RunOutcome::NoPlan => {}
        RunOutcome::Executed { plan, report } => print_report(plan, report),
    }
}

fn print_report(plan: &Plan, report: &PlanReport) {
    if plan.is_empty() {
        return;
    }
    let color = if report.failed > 0 || report.cancelled {
        Color::Yellow
    } else {
        Color::Green
    };
    print_status(&report.to_string(), color);
}

fn print_status(status: &str, color: Color) {
    println!(
        "{}[{}]{}",
        SetForegroundColor(color),
        status,
        ResetColor
    );
}

/// Print the plan as pretty JSON in the shape the planner emits
pub fn print_plan(plan: &Plan) {
    match serde_json::to_string_pretty(plan) {
        Ok(json) => println!("{}", json),
        Err(e) => print_warning(&format!("could not render plan: {}", e)),
    }
}

pub fn print_warning(message: &str) {
    eprintln!(
        "{}warning:{} {}",
        SetForegroundColor(Color::Yellow),
        ResetColor,
        message
    );
}
