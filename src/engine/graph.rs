//! Constraint confidence graph
//!
//! [`ConfidenceGraph`] holds, for every (candidate, constraint) pair, the best
//! confidence seen for that candidate across all partner pairings.
//! [`ComponentScores`] folds it into a candidate x component matrix, gated by
//! shape type.

use crate::error::{AdapterError, BuildError};

use super::BuildAttempt;

/// Dense candidates x constraints confidence matrix
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceGraph {
    values: Vec<Vec<f64>>,
    constraint_count: usize,
}

impl ConfidenceGraph {
    /// An all-zero graph
    pub fn new(candidate_count: usize, constraint_count: usize) -> Self {
        Self {
            values: vec![vec![0.0; constraint_count]; candidate_count],
            constraint_count,
        }
    }

    /// Evaluate every admissible pairing for the attempt's definition
    pub(crate) fn compute(attempt: &BuildAttempt<'_>) -> Result<Self, BuildError> {
        let pool = attempt.pool;
        let mut graph = Self::new(pool.len(), attempt.definition.constraints.len());

        for (j, definition) in attempt.definition.constraints.iter().enumerate() {
            attempt.check_time()?;
            if attempt.debug {
                log::debug!("[{}] evaluating {}", attempt.name(), definition);
            }

            if definition.is_unary() {
                for (i, candidate) in pool.iter().enumerate() {
                    if let Some(value) = skip_missing(attempt.confidence(j, &[candidate]))? {
                        attempt.trace_pairing(j, &[candidate], value);
                        graph.record(i, j, value);
                    }
                }
                continue;
            }

            let first = attempt.component_of(j, 0);
            let second = attempt.component_of(j, 1);
            for (i1, s1) in pool.iter().enumerate() {
                for (i2, s2) in pool.iter().enumerate() {
                    if s1.id == s2.id {
                        continue;
                    }
                    attempt.check_time()?;

                    let args = if attempt.slot_matches(s1, first) && attempt.slot_matches(s2, second) {
                        [s1, s2]
                    } else if attempt.slot_matches(s2, first) && attempt.slot_matches(s1, second) {
                        [s2, s1]
                    } else {
                        continue;
                    };

                    let Some(value) = skip_missing(attempt.confidence(j, &args))? else {
                        continue;
                    };
                    attempt.trace_pairing(j, &args, value);

                    graph.record(i1, j, value);
                    if value > attempt.config.pairing_threshold {
                        graph.record(i2, j, value);
                    }
                }
            }
        }

        Ok(graph)
    }

    /// Raise a cell to `value` if it is higher
    pub fn record(&mut self, candidate: usize, constraint: usize, value: f64) {
        let cell = &mut self.values[candidate][constraint];
        if value > *cell {
            *cell = value;
        }
    }

    pub fn get(&self, candidate: usize, constraint: usize) -> f64 {
        self.values[candidate][constraint]
    }

    /// All constraint values for one candidate
    pub fn row(&self, candidate: usize) -> &[f64] {
        &self.values[candidate]
    }

    pub fn candidate_count(&self) -> usize {
        self.values.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraint_count
    }
}

/// Pairings whose candidates lack geometry are skipped, not fatal
fn skip_missing(result: Result<f64, AdapterError>) -> Result<Option<f64>, BuildError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AdapterError::MissingGeometry { candidate }) => {
            log::trace!("skipping pairing, {} has no geometry", candidate);
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Candidate x component scores derived from a [`ConfidenceGraph`]
///
/// A cell is `None` when the candidate's type does not fit the component;
/// otherwise it is the mean of the graph values for the constraints touching
/// that component, or 1.0 when no constraint does.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentScores {
    cells: Vec<Vec<Option<f64>>>,
}

impl ComponentScores {
    pub(crate) fn compute(graph: &ConfidenceGraph, attempt: &BuildAttempt<'_>) -> Self {
        let definition = attempt.definition;
        let touching: Vec<Vec<usize>> = definition
            .components
            .iter()
            .map(|c| definition.constraints_for_component(&c.name))
            .collect();

        let cells = attempt
            .pool
            .iter()
            .enumerate()
            .map(|(i, candidate)| {
                definition
                    .components
                    .iter()
                    .zip(&touching)
                    .map(|(component, constraints)| {
                        if !attempt.slot_matches(candidate, component) {
                            return None;
                        }
                        if constraints.is_empty() {
                            return Some(1.0);
                        }
                        let sum: f64 = constraints.iter().map(|&j| graph.get(i, j)).sum();
                        Some(sum / constraints.len() as f64)
                    })
                    .collect()
            })
            .collect();

        Self { cells }
    }

    pub fn get(&self, candidate: usize, component: usize) -> Option<f64> {
        self.cells[candidate][component]
    }

    /// Candidate indices for a component, best score first
    ///
    /// Type mismatches are left out. Equal scores keep pool order.
    pub fn ranked(&self, component: usize) -> Vec<(usize, f64)> {
        let mut column: Vec<(usize, f64)> = self
            .cells
            .iter()
            .enumerate()
            .filter_map(|(i, row)| row[component].map(|score| (i, score)))
            .collect();
        column.sort_by(|a, b| b.1.total_cmp(&a.1));
        column
    }

    pub fn candidate_count(&self) -> usize {
        self.cells.len()
    }
}
