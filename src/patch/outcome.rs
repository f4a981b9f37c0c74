//! Per-entity results of patch operations.

use crate::error::ReconcileError;
use crate::namespace::Namespace;
use std::fmt;

/// Outcome is what happened to a single entity.
#[derive(Debug)]
pub enum Outcome {
    Applied,
    /// Add found the entity already in the target.
    AlreadyPresent,
    /// Remove found the entity already gone.
    AlreadyAbsent,
    /// The entity could not be patched; the run continued without it.
    Skipped(ReconcileError),
    /// The entity was left untouched and needs a manual look.
    Flagged(String),
}

impl Outcome {
    /// Returns true for outcomes that need manual follow-up.
    pub fn needs_attention(&self) -> bool {
        matches!(self, Outcome::Skipped(_) | Outcome::Flagged(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied => f.write_str("applied"),
            Outcome::AlreadyPresent => f.write_str("already present"),
            Outcome::AlreadyAbsent => f.write_str("already absent"),
            Outcome::Skipped(err) => write!(f, "skipped: {}", err),
            Outcome::Flagged(reason) => write!(f, "flagged: {}", reason),
        }
    }
}

/// EntityOutcome ties an outcome to the entity it concerns.
#[derive(Debug)]
pub struct EntityOutcome {
    pub namespace: Namespace,
    pub name: String,
    pub outcome: Outcome,
}

impl fmt::Display for EntityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.namespace.noun(),
            self.namespace.qualify(&self.name),
            self.outcome
        )
    }
}

/// Outcomes is the ordered list of entity outcomes of one or more operations.
#[derive(Debug, Default)]
pub struct Outcomes {
    outcomes: Vec<EntityOutcome>,
}

impl Outcomes {
    pub fn new() -> Self {
        Outcomes {
            outcomes: Vec::new(),
        }
    }

    /// Records an outcome.
    pub fn record(&mut self, namespace: &Namespace, name: impl Into<String>, outcome: Outcome) {
        self.outcomes.push(EntityOutcome {
            namespace: namespace.clone(),
            name: name.into(),
            outcome,
        });
    }

    /// Appends all outcomes of another list.
    pub fn extend(&mut self, other: Outcomes) {
        self.outcomes.extend(other.outcomes);
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.outcomes.iter()
    }

    /// Outcomes that changed the document.
    pub fn applied(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Applied))
    }

    /// Outcomes that need manual follow-up.
    pub fn needs_attention(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.outcomes.iter().filter(|o| o.outcome.needs_attention())
    }

    /// Outcome recorded for a name, if any.
    pub fn get(&self, name: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.name == name)
            .map(|o| &o.outcome)
    }
}

impl IntoIterator for Outcomes {
    type Item = EntityOutcome;
    type IntoIter = std::vec::IntoIter<EntityOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

impl fmt::Display for Outcomes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, outcome) in self.outcomes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", outcome)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        let mut outcomes = Outcomes::new();
        outcomes.record(&Namespace::Field("Qux".into()), "amount", Outcome::Applied);
        outcomes.record(
            &Namespace::Schema,
            "Foo",
            Outcome::Skipped(ReconcileError::entity_not_found("schema", "Foo", "models.yaml")),
        );
        let display = outcomes.to_string();
        assert!(display.contains("field Qux.amount: applied"));
        assert!(display.contains("schema Foo: skipped: schema 'Foo' not found in models.yaml"));
    }

    #[test]
    fn test_needs_attention() {
        let mut outcomes = Outcomes::new();
        outcomes.record(&Namespace::Schema, "A", Outcome::Applied);
        outcomes.record(&Namespace::Schema, "B", Outcome::AlreadyPresent);
        outcomes.record(&Namespace::Parameter, "c", Outcome::Flagged("no component".into()));
        assert_eq!(outcomes.applied().count(), 1);
        assert_eq!(outcomes.needs_attention().count(), 1);
        assert!(matches!(outcomes.get("B"), Some(Outcome::AlreadyPresent)));
    }
}
