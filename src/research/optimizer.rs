//! Parallel schedule optimization
//!
//! Groups steps into dependency levels that can run concurrently and finds
//! the critical path, whose duration is the plan's minimum makespan given
//! unlimited parallel capacity.

use crate::types::{AppError, ExecutionSchedule, ResearchStep, Result};
use std::collections::HashMap;

/// Compute parallel groups, critical path and estimated total time.
///
/// Group 0 holds the steps without dependencies; group k holds the steps
/// whose dependencies are all placed in groups `0..k`. Within a group steps
/// are ordered by ascending priority, then id.
///
/// Duplicate ids, unknown dependencies and cycles are configuration errors.
pub fn optimize_for_parallel_execution(steps: &[ResearchStep]) -> Result<ExecutionSchedule> {
    if steps.is_empty() {
        return Ok(ExecutionSchedule::default());
    }

    let index = index_steps(steps)?;
    let deps = resolve_dependencies(steps, &index)?;
    let levels = level(steps, &deps)?;

    // Longest path over the levelled (topological) order
    let order: Vec<usize> = levels.iter().flatten().copied().collect();
    let mut finish = vec![0.0_f64; steps.len()];
    let mut predecessor: Vec<Option<usize>> = vec![None; steps.len()];
    let mut position = vec![0usize; steps.len()];
    for (pos, &v) in order.iter().enumerate() {
        position[v] = pos;
    }

    for &v in &order {
        let mut best: Option<usize> = None;
        for &u in &deps[v] {
            best = match best {
                Some(b)
                    if finish[b] > finish[u]
                        || (finish[b] == finish[u] && position[b] < position[u]) =>
                {
                    Some(b)
                }
                _ => Some(u),
            };
        }
        finish[v] = steps[v].estimated_duration + best.map(|b| finish[b]).unwrap_or(0.0);
        predecessor[v] = best;
    }

    let mut end = order[0];
    for &v in &order[1..] {
        if finish[v] > finish[end] {
            end = v;
        }
    }

    let mut critical_path = vec![steps[end].id.clone()];
    let mut cursor = end;
    while let Some(prev) = predecessor[cursor] {
        critical_path.push(steps[prev].id.clone());
        cursor = prev;
    }
    critical_path.reverse();

    let parallel_groups = levels
        .into_iter()
        .map(|group| group.into_iter().map(|i| steps[i].id.clone()).collect())
        .collect::<Vec<Vec<String>>>();

    tracing::debug!(
        steps = steps.len(),
        groups = parallel_groups.len(),
        critical_path_len = critical_path.len(),
        estimated_total_time = finish[end],
        "Optimized schedule"
    );

    Ok(ExecutionSchedule {
        parallel_groups,
        critical_path,
        estimated_total_time: finish[end],
    })
}

/// Check that a step list forms a DAG with unique ids and known dependencies.
pub fn validate_dag(steps: &[ResearchStep]) -> Result<()> {
    let index = index_steps(steps)?;
    let deps = resolve_dependencies(steps, &index)?;
    level(steps, &deps).map(|_| ())
}

fn index_steps(steps: &[ResearchStep]) -> Result<HashMap<&str, usize>> {
    let mut index = HashMap::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        if index.insert(step.id.as_str(), i).is_some() {
            return Err(AppError::Configuration(format!(
                "Duplicate step id '{}'",
                step.id
            )));
        }
    }
    Ok(index)
}

fn resolve_dependencies(
    steps: &[ResearchStep],
    index: &HashMap<&str, usize>,
) -> Result<Vec<Vec<usize>>> {
    steps
        .iter()
        .map(|step| {
            let mut resolved = Vec::with_capacity(step.dependencies.len());
            for dep in &step.dependencies {
                let &i = index.get(dep.as_str()).ok_or_else(|| {
                    AppError::Configuration(format!(
                        "Step '{}' depends on unknown step '{}'",
                        step.id, dep
                    ))
                })?;
                if !resolved.contains(&i) {
                    resolved.push(i);
                }
            }
            Ok(resolved)
        })
        .collect()
}

/// Kahn-style layering. Fails when a round places nothing while steps remain.
fn level(steps: &[ResearchStep], deps: &[Vec<usize>]) -> Result<Vec<Vec<usize>>> {
    let mut placed = vec![false; steps.len()];
    let mut remaining = steps.len();
    let mut levels = Vec::new();

    while remaining > 0 {
        let mut group: Vec<usize> = (0..steps.len())
            .filter(|&i| !placed[i] && deps[i].iter().all(|&d| placed[d]))
            .collect();

        if group.is_empty() {
            let stuck: Vec<&str> = (0..steps.len())
                .filter(|&i| !placed[i])
                .map(|i| steps[i].id.as_str())
                .collect();
            return Err(AppError::Configuration(format!(
                "Dependency cycle detected among steps: {}",
                stuck.join(", ")
            )));
        }

        group.sort_by(|&a, &b| {
            steps[a]
                .priority
                .cmp(&steps[b].priority)
                .then_with(|| steps[a].id.cmp(&steps[b].id))
        });
        for &i in &group {
            placed[i] = true;
        }
        remaining -= group.len();
        levels.push(group);
    }

    Ok(levels)
}
