//! Exhaustive backtracking search
//!
//! Every type-compatible permutation of the pruned pool is scored by
//! AND-combining its constraint confidences; the best one wins and ties keep
//! the first found. Candidates no component could take are pruned before the
//! search, and type mismatches are never explored.

use crate::error::{AdapterError, BuildError, FailureReason, ShapeBuildFailure};

use super::budget::SearchBudget;
use super::{Assignment, BuildAttempt};

/// A complete assignment and its scores
#[derive(Debug, Clone)]
struct Solution {
    /// Pool index per component, in definition order
    candidates: Vec<usize>,
    /// Confidence per constraint, in definition order
    values: Vec<f64>,
    score: f64,
}

pub(crate) fn assign(attempt: &BuildAttempt<'_>, budget: &mut SearchBudget) -> Result<Assignment, BuildError> {
    let definition = attempt.definition;
    let pruned: Vec<usize> = attempt
        .pool
        .iter()
        .enumerate()
        .filter(|(_, c)| definition.components.iter().any(|k| attempt.slot_matches(c, k)))
        .map(|(i, _)| i)
        .collect();

    if attempt.debug {
        let kept: Vec<String> = pruned.iter().map(|&i| attempt.pool[i].to_string()).collect();
        log::debug!(
            "[{}] pruned pool ({} of {}): {}",
            attempt.name(),
            pruned.len(),
            attempt.pool.len(),
            kept.join(", ")
        );
    }

    let mut chosen = Vec::with_capacity(definition.num_components());
    let mut used = vec![false; attempt.pool.len()];
    let best = search(attempt, &pruned, &mut chosen, &mut used, budget)?;

    if budget.is_exhausted() {
        let failure = ShapeBuildFailure::unsatisfied(
            attempt.name(),
            format!(
                "search cutoff of {} partial assignments reached",
                budget.cutoff()
            ),
        );
        attempt.report_failure(&failure);
        return Err(failure.into());
    }

    let Some(solution) = best else {
        let failure = ShapeBuildFailure::new(
            attempt.name(),
            FailureReason::MissingComponent,
            "no complete assignment of candidates to components",
        );
        attempt.report_failure(&failure);
        return Err(failure.into());
    };

    if attempt.debug {
        log::debug!(
            "[{}] best assignment scores {:.3} after {} partial assignments",
            attempt.name(),
            solution.score,
            budget.generated()
        );
    }

    if solution.score <= attempt.config.satisfaction_threshold {
        let mut failure = ShapeBuildFailure::unsatisfied(
            attempt.name(),
            format!("best assignment only reaches {:.3}", solution.score),
        );
        let weakest = solution
            .values
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1));
        if let Some((j, value)) = weakest {
            let constraint = &definition.constraints[j];
            failure.message = format!("{}; weakest is {} at {:.3}", failure.message, constraint, value);
            failure = failure.with_constraint(constraint.to_string());
        }
        attempt.report_failure(&failure);
        return Err(failure.into());
    }

    let mut assignment = Assignment::with_capacity(definition.num_components());
    for (component, &i) in definition.components.iter().zip(&solution.candidates) {
        let touching = definition.constraints_for_component(&component.name);
        let confidence = if touching.is_empty() {
            1.0
        } else {
            touching.iter().map(|&j| solution.values[j]).sum::<f64>() / touching.len() as f64
        };
        assignment.push(i, confidence);
    }
    Ok(assignment)
}

fn search(
    attempt: &BuildAttempt<'_>,
    pruned: &[usize],
    chosen: &mut Vec<usize>,
    used: &mut [bool],
    budget: &mut SearchBudget,
) -> Result<Option<Solution>, BuildError> {
    attempt.check_time()?;
    if !budget.spend() {
        return Ok(None);
    }

    let components = &attempt.definition.components;
    if chosen.len() == components.len() {
        return score(attempt, chosen).map(Some);
    }

    let slot = &components[chosen.len()];
    let mut best: Option<Solution> = None;
    for &i in pruned {
        if used[i] || !attempt.slot_matches(&attempt.pool[i], slot) {
            continue;
        }

        used[i] = true;
        chosen.push(i);
        let result = search(attempt, pruned, chosen, used, budget);
        chosen.pop();
        used[i] = false;

        if let Some(solution) = result? {
            if best.as_ref().map_or(true, |b| solution.score > b.score) {
                best = Some(solution);
            }
        }
        if budget.is_exhausted() {
            return Ok(None);
        }
    }
    Ok(best)
}

/// AND-combine the constraint confidences of a complete assignment
fn score(attempt: &BuildAttempt<'_>, chosen: &[usize]) -> Result<Solution, BuildError> {
    let mut values = Vec::with_capacity(attempt.definition.constraints.len());
    for j in 0..attempt.definition.constraints.len() {
        let args: Vec<_> = attempt
            .parameter_slots(j)
            .iter()
            .map(|&k| &attempt.pool[chosen[k]])
            .collect();
        let value = match attempt.confidence(j, &args) {
            Ok(value) => value,
            Err(AdapterError::MissingGeometry { .. }) => 0.0,
            Err(err) => return Err(err.into()),
        };
        values.push(value);
    }

    let score = attempt.config.and_combination.combine(values.iter().copied());
    Ok(Solution {
        candidates: chosen.to_vec(),
        values,
        score,
    })
}
