//! Rule tables: condition -> weight -> reason
//!
//! A stage describes its scoring as plain data and evaluates it here, so every
//! rule can be listed, audited and tested on its own.
//!
//! Two evaluation modes:
//! - [`first_match`]: mutually exclusive bands, only the first rule that holds
//!   contributes (order the table from most to least severe).
//! - [`every_match`]: independent checks, each rule that holds contributes.

use super::Findings;

/// One scoring rule over a subject of type `T`
pub struct Rule<T> {
    pub name: &'static str,
    pub weight: u32,
    pub reason: String,
    pub condition: Box<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> Rule<T> {
    pub fn new<F>(name: &'static str, weight: u32, reason: impl Into<String>, condition: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            weight,
            reason: reason.into(),
            condition: Box::new(condition),
        }
    }

    pub fn holds(&self, subject: &T) -> bool {
        (self.condition)(subject)
    }
}

impl<T> std::fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("reason", &self.reason)
            .finish()
    }
}

/// Apply the first rule that holds, if any
pub fn first_match<T>(rules: &[Rule<T>], subject: &T, findings: &mut Findings) {
    if let Some(rule) = rules.iter().find(|r| r.holds(subject)) {
        findings.add(rule.weight, rule.reason.clone());
    }
}

/// Apply every rule that holds, in table order
pub fn every_match<T>(rules: &[Rule<T>], subject: &T, findings: &mut Findings) {
    for rule in rules.iter().filter(|r| r.holds(subject)) {
        findings.add(rule.weight, rule.reason.clone());
    }
}
