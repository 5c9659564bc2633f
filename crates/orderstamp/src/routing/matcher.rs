use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::models::RoutingRule;
use crate::sanitize::validate_folder_name;
use crate::sku::contains_ignore_case;

/// Folder of the first active rule, by ascending priority, whose pattern
/// occurs in the SKU ignoring case. `None` means no route.
///
/// Equal priorities keep the order of `rules` (the sort is stable).
pub fn resolve_folder<'a>(sku: &str, rules: &'a [RoutingRule]) -> Option<&'a str> {
    let mut active: Vec<&RoutingRule> = rules.iter().filter(|r| r.active).collect();
    active.sort_by_key(|r| r.priority);

    active
        .into_iter()
        .find(|rule| contains_ignore_case(sku, &rule.pattern))
        .map(|rule| rule.folder_name.as_str())
}

/// Outcome of routing one SKU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResult {
    Matched { rule_id: String, folder_name: String },
    NoMatch,
}

impl RouteResult {
    pub fn folder(&self) -> Option<&str> {
        match self {
            RouteResult::Matched { folder_name, .. } => Some(folder_name),
            RouteResult::NoMatch => None,
        }
    }
}

impl std::fmt::Display for RouteResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteResult::Matched { folder_name, .. } => f.write_str(folder_name),
            RouteResult::NoMatch => f.write_str("No matching rule found"),
        }
    }
}

/// Active rules sorted once for repeated lookups.
pub struct Router {
    rules: Vec<RoutingRule>,
}

impl Router {
    pub fn new(rules: Vec<RoutingRule>) -> Self {
        let mut rules: Vec<RoutingRule> = rules.into_iter().filter(|r| r.active).collect();
        // Stable: equal priorities keep store order.
        rules.sort_by_key(|r| r.priority);
        Self { rules }
    }

    pub fn route(&self, sku: &str) -> RouteResult {
        for rule in &self.rules {
            if contains_ignore_case(sku, &rule.pattern) {
                return RouteResult::Matched {
                    rule_id: rule.id.clone(),
                    folder_name: rule.folder_name.clone(),
                };
            }
        }

        RouteResult::NoMatch
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    /// Priorities shared by more than one active rule, with the patterns
    /// involved. Such ties resolve by store order.
    pub fn duplicate_priorities(&self) -> Vec<(i32, Vec<String>)> {
        let mut by_priority: BTreeMap<i32, Vec<String>> = BTreeMap::new();
        for rule in &self.rules {
            by_priority
                .entry(rule.priority)
                .or_default()
                .push(rule.pattern.clone());
        }
        by_priority
            .into_iter()
            .filter(|(_, patterns)| patterns.len() > 1)
            .collect()
    }
}

/// Checks the fields an operator must supply for a rule.
pub fn validate_rule(pattern: &str, folder_name: &str) -> Result<(), ValidationError> {
    if pattern.trim().is_empty() || folder_name.trim().is_empty() {
        return Err(ValidationError::MissingRuleFields);
    }
    validate_folder_name(folder_name)
}
