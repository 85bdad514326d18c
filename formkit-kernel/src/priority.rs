//! Priority resolution for view-conditional entries.

use formkit_api::IdentityRef;

use crate::action::ActionContext;
use crate::condition::ConditionEvaluator;

/// An entry with a display priority and an optional view requirement.
pub trait Prioritized {
    /// Lower is shown first.
    fn priority(&self) -> i32;

    fn view_requirement(&self) -> Option<&str>;
}

/// Keep the entries whose requirement holds, ordered by ascending priority.
///
/// The sort is stable, so equal priorities keep their input order. A
/// requirement that fails to evaluate excludes its entry.
pub fn resolve_items<'a, T: Prioritized>(
    items: &'a [T],
    evaluator: &ConditionEvaluator,
    identity: &IdentityRef,
    context: &ActionContext,
) -> Vec<&'a T> {
    let mut visible: Vec<&T> = items
        .iter()
        .filter(|item| match item.view_requirement() {
            Some(requirement) if !requirement.trim().is_empty() => {
                evaluator.evaluate(identity, requirement, context)
            }
            _ => true,
        })
        .collect();
    visible.sort_by_key(|item| item.priority());
    visible
}
