use crate::error::job::{JobError, JobResult};
use crate::types::steps::step_item::StepItem;

/// Covered transaction range of a finished step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginRange {
    pub lowest: u64,
    pub highest: u64,
}

impl TryFrom<&StepItem> for OriginRange {
    type Error = JobError;

    fn try_from(step: &StepItem) -> Result<Self, Self::Error> {
        let (lowest, highest) = step.origin_bounds().ok_or_else(|| {
            JobError::ValidationError(format!(
                "Step {} of job {} has malformed origins {:?}",
                step.step_id, step.job_id, step.origins
            ))
        })?;
        Ok(Self { lowest, highest })
    }
}

/// Greedy adjacency pairing over `ranges`, in discovery order.
///
/// Returns `(left, right)` index pairs where `ranges[left]` ends exactly one
/// below where `ranges[right]` begins. Each index appears in at most one pair.
pub fn find_adjacent_pairs(ranges: &[OriginRange]) -> Vec<(usize, usize)> {
    let mut used = vec![false; ranges.len()];
    let mut pairs = Vec::new();

    for (i, right) in ranges.iter().enumerate() {
        if used[i] {
            continue;
        }
        for (j, left) in ranges.iter().enumerate() {
            if i == j || used[j] {
                continue;
            }
            if left.highest.checked_add(1) == Some(right.lowest) {
                used[i] = true;
                used[j] = true;
                pairs.push((j, i));
                break;
            }
        }
    }

    pairs
}

/// Pairs `steps` by adjacency of their origins.
pub fn pair_steps(steps: &[StepItem]) -> JobResult<Vec<(usize, usize)>> {
    let ranges = steps.iter().map(OriginRange::try_from).collect::<JobResult<Vec<_>>>()?;
    Ok(find_adjacent_pairs(&ranges))
}

/// Checks that two claimed steps can be folded into one merge step.
pub fn validate_merge_pair(left: &StepItem, right: &StepItem) -> JobResult<()> {
    let mismatch = |what: &str| {
        JobError::ValidationError(format!(
            "Steps {} and {} of job {} differ in {}",
            left.step_id, right.step_id, left.job_id, what
        ))
    };

    if left.job_id != right.job_id {
        return Err(mismatch("job"));
    }
    if left.developer != right.developer || left.repo != right.repo {
        return Err(mismatch("repo"));
    }
    if left.job_task != right.job_task {
        return Err(mismatch("task"));
    }
    if left.chain != right.chain {
        return Err(mismatch("chain"));
    }
    if left.args != right.args {
        return Err(mismatch("args"));
    }

    for step in [left, right] {
        if step.result.is_none() {
            return Err(JobError::ValidationError(format!(
                "Step {} of job {} has no result",
                step.step_id, step.job_id
            )));
        }
        if step.compute_time_ms().is_none() {
            return Err(JobError::ValidationError(format!(
                "Step {} of job {} is missing its start or finish timestamp",
                step.step_id, step.job_id
            )));
        }
    }

    Ok(())
}
