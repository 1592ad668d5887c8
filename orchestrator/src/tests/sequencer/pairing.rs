use assert_matches::assert_matches;
use rstest::*;

use crate::error::job::JobError;
use crate::sequencer::pairing::{find_adjacent_pairs, pair_steps, validate_merge_pair, OriginRange};
use crate::tests::common::{build_finished_step, build_job_item};
use crate::types::steps::step_item::StepItem;

fn ranges(bounds: &[(u64, u64)]) -> Vec<OriginRange> {
    bounds.iter().map(|&(lowest, highest)| OriginRange { lowest, highest }).collect()
}

#[rstest]
#[case::two_leaves(&[(0, 0), (1, 1)], vec![(0, 1)])]
#[case::right_found_first(&[(2, 2), (0, 1)], vec![(1, 0)])]
#[case::each_step_used_once(&[(0, 0), (1, 1), (2, 2)], vec![(0, 1)])]
#[case::gap_blocks_pairing(&[(0, 1), (2, 3), (5, 6), (8, 8)], vec![(0, 1)])]
#[case::two_independent_merges(&[(0, 1), (2, 3), (4, 4), (5, 7)], vec![(0, 1), (2, 3)])]
#[case::single_step(&[(0, 4)], vec![])]
#[case::nothing_ready(&[], vec![])]
fn adjacent_pairs_follow_discovery_order(#[case] bounds: &[(u64, u64)], #[case] expected: Vec<(usize, usize)>) {
    assert_eq!(find_adjacent_pairs(&ranges(bounds)), expected);
}

#[rstest]
fn paired_steps_never_overlap() {
    let pairs = find_adjacent_pairs(&ranges(&[(3, 3), (0, 0), (1, 1), (2, 2), (4, 4)]));
    let mut seen: Vec<usize> = pairs.iter().flat_map(|&(l, r)| [l, r]).collect();
    let total = seen.len();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), total);
    assert_eq!(pairs, vec![(3, 0), (1, 2)]);
}

#[rstest]
fn malformed_origins_are_rejected() {
    let job = build_job_item(2);
    let mut step = build_finished_step(&job, &[0]);
    step.origins = vec!["zero".to_string()];

    assert_matches!(pair_steps(&[step]), Err(JobError::ValidationError(_)));
}

#[rstest]
fn compatible_steps_can_merge() {
    let job = build_job_item(2);
    let left = build_finished_step(&job, &[0]);
    let right = build_finished_step(&job, &[1]);

    assert!(validate_merge_pair(&left, &right).is_ok());
}

#[rstest]
#[case::chain(|s: &mut StepItem| s.chain = "mainnet".to_string())]
#[case::repo(|s: &mut StepItem| s.repo = "other".to_string())]
#[case::args(|s: &mut StepItem| s.args = None)]
#[case::missing_result(|s: &mut StepItem| s.result = None)]
#[case::missing_timestamp(|s: &mut StepItem| s.finished_at = None)]
fn incompatible_steps_are_rejected(#[case] tamper: fn(&mut StepItem)) {
    let job = build_job_item(2);
    let left = build_finished_step(&job, &[0]);
    let mut right = build_finished_step(&job, &[1]);
    tamper(&mut right);

    assert_matches!(validate_merge_pair(&left, &right), Err(JobError::ValidationError(_)));
}
