use std::fmt::Display;

use colored::Colorize;

/// Outcome of one independent unit of work (an isolate, a gene, a job).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    Complete,
    /// Output was produced, but something was left out.
    Partial(Vec<String>),
    /// No output was produced for this unit.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub unit: String,
    pub status: UnitStatus,
}

/// Per-unit outcomes of one stage, in processing order.
///
/// A failed unit never stops its siblings; the aggregate outcome of the stage
/// is computed from here rather than from log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    label: String,
    units: Vec<UnitReport>,
}

impl BatchReport {
    pub fn new<S: Into<String>>(label: S) -> Self {
        Self {
            label: label.into(),
            units: Vec::with_capacity(16),
        }
    }

    pub fn complete<S: Into<String>>(&mut self, unit: S) {
        self.push(unit, UnitStatus::Complete);
    }

    /// Record a unit that produced output; with no warnings it counts as complete.
    pub fn partial<S: Into<String>>(&mut self, unit: S, warnings: Vec<String>) {
        if warnings.is_empty() {
            self.complete(unit);
        } else {
            self.push(unit, UnitStatus::Partial(warnings));
        }
    }

    pub fn failed<S: Into<String>, R: Display>(&mut self, unit: S, reason: R) {
        self.push(unit, UnitStatus::Failed(reason.to_string()));
    }

    fn push<S: Into<String>>(&mut self, unit: S, status: UnitStatus) {
        let unit = unit.into();
        match &status {
            UnitStatus::Complete => log::debug!("{}: {unit} complete", self.label),
            UnitStatus::Partial(w) => log::debug!("{}: {unit} partial ({})", self.label, w.join("; ")),
            UnitStatus::Failed(reason) => log::error!("{}: {unit} failed: {reason}", self.label),
        }
        self.units.push(UnitReport { unit, status });
    }

    pub fn units(&self) -> &[UnitReport] {
        &self.units
    }

    pub fn status(&self, unit: &str) -> Option<&UnitStatus> {
        self.units
            .iter()
            .find(|u| u.unit == unit)
            .map(|u| &u.status)
    }

    pub fn num_complete(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Complete))
    }

    pub fn num_partial(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Partial(_)))
    }

    pub fn num_failed(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Failed(_)))
    }

    fn count<F: Fn(&UnitStatus) -> bool>(&self, f: F) -> usize {
        self.units.iter().filter(|u| f(&u.status)).count()
    }

    /// Print a summary line, then every warning and failure, to stderr.
    pub fn print_recap(&self) {
        eprintln!(
            "\n{} {}: {} complete, {} partial, {} failed",
            "SUMMARY".cyan(),
            self.label,
            self.num_complete().to_string().green(),
            self.num_partial().to_string().yellow(),
            self.num_failed().to_string().red(),
        );
        for u in &self.units {
            match &u.status {
                UnitStatus::Complete => {}
                UnitStatus::Partial(warnings) => {
                    for w in warnings {
                        eprintln!("{} {}: {w}", "WARNING".yellow(), u.unit);
                    }
                }
                UnitStatus::Failed(reason) => {
                    eprintln!("{} {}: {reason}", "FAILED".red(), u.unit);
                }
            }
        }
    }
}
