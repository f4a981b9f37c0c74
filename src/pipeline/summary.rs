//! End-of-run summary.

use crate::error::ReconcileError;
use crate::patch::Outcomes;
use crate::report::DiffReport;
use std::fmt;

/// RunSummary collects what every stage of a run did.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Outcomes,
    /// External references made internal, as `(from, to)`.
    pub rewritten: Vec<(String, String)>,
    pub report: Option<DiffReport>,
    pub validated: bool,
    pub dry_run: bool,
    /// The error that stopped the run. Nothing was written when set.
    pub failure: Option<ReconcileError>,
}

impl RunSummary {
    pub fn new() -> Self {
        RunSummary::default()
    }

    /// Returns true if any entity was skipped or flagged.
    pub fn needs_attention(&self) -> bool {
        self.outcomes.needs_attention().next().is_some()
    }

    /// Returns true if the run changed (or in a dry run, would change) the target.
    pub fn changed(&self) -> bool {
        self.failure.is_none()
            && (self.outcomes.applied().next().is_some() || !self.rewritten.is_empty())
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let applied = self.outcomes.applied().count();
        let attention = self.outcomes.needs_attention().count();
        let unchanged = self.outcomes.len() - applied - attention;
        write!(
            f,
            "{}{} applied, {} unchanged, {} need attention, {} references rewritten",
            if self.dry_run { "(dry run) " } else { "" },
            applied,
            unchanged,
            attention,
            self.rewritten.len()
        )?;
        for outcome in self.outcomes.applied() {
            write!(f, "\n  + {}", outcome)?;
        }
        for (from, to) in &self.rewritten {
            write!(f, "\n  ~ {} -> {}", from, to)?;
        }
        for outcome in self.outcomes.needs_attention() {
            write!(f, "\n  ! {}", outcome)?;
        }
        if self.validated {
            write!(f, "\nvalidation passed")?;
        }
        if let Some(err) = &self.failure {
            write!(f, "\nfailed, target left unchanged: {}", err)?;
        }
        Ok(())
    }
}
