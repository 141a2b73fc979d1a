//! Greedy best-fit assignment
//!
//! Components are filled in definition order. Each takes its highest-scoring
//! unclaimed candidate whose constraints all clear the satisfaction
//! threshold. There is no backtracking: a candidate claimed by an earlier
//! component is never released.

use crate::error::{BuildError, ShapeBuildFailure};

use super::graph::{ComponentScores, ConfidenceGraph};
use super::{Assignment, BuildAttempt};

pub(crate) fn assign(
    attempt: &BuildAttempt<'_>,
    graph: &ConfidenceGraph,
    scores: &ComponentScores,
) -> Result<Assignment, BuildError> {
    let definition = attempt.definition;
    let threshold = attempt.config.satisfaction_threshold;
    let mut claimed = vec![false; attempt.pool.len()];
    let mut assignment = Assignment::with_capacity(definition.num_components());

    for (k, component) in definition.components.iter().enumerate() {
        attempt.check_time()?;
        let touching = definition.constraints_for_component(&component.name);

        let mut best_unclaimed = None;
        let mut chosen = None;
        for (i, score) in scores.ranked(k) {
            if claimed[i] {
                continue;
            }
            best_unclaimed.get_or_insert(i);
            if touching.iter().all(|&j| graph.get(i, j) > threshold) {
                chosen = Some((i, score));
                break;
            }
        }

        match (chosen, best_unclaimed) {
            (Some((i, score)), _) => {
                if attempt.debug {
                    log::debug!(
                        "[{}] {} <- {} ({:.3})",
                        attempt.name(),
                        component.name,
                        attempt.pool[i],
                        score
                    );
                }
                claimed[i] = true;
                assignment.push(i, score);
            }
            (None, None) => {
                let failure = ShapeBuildFailure::missing_component(attempt.name(), &component.name);
                attempt.report_failure(&failure);
                return Err(failure.into());
            }
            (None, Some(i)) => {
                // touching is non-empty here: an unconstrained slot accepts any unclaimed match
                let weakest = touching
                    .iter()
                    .map(|&j| (j, graph.get(i, j)))
                    .min_by(|a, b| a.1.total_cmp(&b.1));
                let mut failure = ShapeBuildFailure::unsatisfied(
                    attempt.name(),
                    format!("no unclaimed candidate for '{}' satisfies its constraints", component.name),
                )
                .with_component(&component.name);
                if let Some((j, value)) = weakest {
                    let constraint = &definition.constraints[j];
                    failure.message = format!(
                        "{}; weakest is {} at {:.3}",
                        failure.message, constraint, value
                    );
                    failure = failure.with_constraint(constraint.to_string());
                }
                attempt.report_failure(&failure);
                return Err(failure.into());
            }
        }
    }

    Ok(assignment)
}
