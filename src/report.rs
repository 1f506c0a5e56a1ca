//! Plain-text tables for the terminal.

use std::fmt::Write;

use crate::analysis::{Analysis, Monitor};
use crate::payoff::PayoffSummary;
use crate::state::LockedPosition;
use crate::types::{Leg, LegComparison};

pub fn legs_table(legs: &[Leg]) -> String {
    let mut out = format!("{:<8} {:>10} {:>10}\n", "Leg", "Strike", "Premium");
    for l in legs {
        let _ = writeln!(out, "{:<8} {:>10} {:>10.2}", l.role.to_string(), l.strike, l.premium);
    }
    out
}

pub fn comparison_table(rows: &[LegComparison]) -> String {
    let mut out = format!(
        "{:<8} {:>10} {:>10} {:>10} {:>10}\n",
        "Leg", "Strike", "Locked", "Now", "Change"
    );
    for c in rows {
        let _ = writeln!(
            out,
            "{:<8} {:>10} {:>10.2} {:>10} {:>10}",
            c.role.to_string(),
            c.strike,
            c.premium_locked,
            opt(c.premium_now),
            opt(c.change()),
        );
    }
    out
}

pub fn payoff_summary(s: &PayoffSummary) -> String {
    let breakevens = if s.breakevens.is_empty() {
        "none".to_string()
    } else {
        s.breakevens
            .iter()
            .map(|b| format!("{b:.1}"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "Net credit: {:.2} ({:.2} per lot)\nMax profit: {:.2}\nMax loss:   {:.2}\nBreakevens: {}\n",
        s.net_credit, s.net_credit_lot, s.max_profit, s.max_loss, breakevens
    )
}

pub fn locked_position(pos: &LockedPosition) -> String {
    let mut out = String::new();
    if let Some(at) = pos.locked_at {
        let _ = writeln!(out, "Locked at {}", at.to_rfc3339());
    }
    if let Some(atm) = pos.atm {
        let _ = writeln!(out, "ATM at lock: {atm}");
    }
    out.push_str(&legs_table(&pos.legs));
    out
}

/// Full report for one `analyze` run.
pub fn render(a: &Analysis) -> String {
    let mut out = format!("ATM detected: {}\n\n", a.atm);

    match &a.suggestion {
        Ok(condor) => {
            out.push_str("Suggested iron condor\n");
            out.push_str(&legs_table(&condor.legs()));
            if let Some(s) = &a.summary {
                out.push('\n');
                out.push_str(&payoff_summary(s));
            }
        }
        Err(e) => {
            let _ = writeln!(out, "No iron condor suggestion: {e}");
        }
    }

    match &a.monitor {
        None => {
            if a.suggestion.is_ok() {
                out.push_str("\nNo position locked. Run `condor lock` to lock this setup.\n");
            }
        }
        Some(m) => out.push_str(&render_monitor(m)),
    }
    out
}

fn render_monitor(m: &Monitor) -> String {
    let mut out = String::from("\nLocked setup vs today");
    match m.locked.locked_at {
        Some(at) => {
            let _ = writeln!(out, " (locked {})", at.format("%Y-%m-%d %H:%M UTC"));
        }
        None => out.push('\n'),
    }
    out.push_str(&comparison_table(&m.comparison));

    if m.flags.is_empty() {
        out.push_str("\nNo adjustment needed.\n");
    } else {
        out.push_str("\nAdjustments needed:\n");
        for f in &m.flags {
            let _ = writeln!(
                out,
                "  {} @ {} -> premium deviation exceeded threshold",
                f.role, f.strike
            );
        }
        if m.replacements.is_empty() {
            out.push_str("No replacement legs found in the current chain.\n");
        } else {
            out.push_str("\nAuto-suggested adjustment\n");
            out.push_str(&legs_table(&m.replacements));
            if let Some(s) = &m.replacement_summary {
                out.push('\n');
                out.push_str(&payoff_summary(s));
            }
        }
    }
    out.push_str("\nRun `condor reset` to unlock.\n");
    out
}

fn opt(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |x| format!("{x:.2}"))
}
