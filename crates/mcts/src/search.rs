//! The synchronous and time-sliced search strategies.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use tilefall_core::{cancel_pair, Decision, GameState, Move, MoveSequence};

use crate::config::{SLOT, VISIT_THRESHOLD};
use crate::node::{clone_root, grow_tree, Node};
use crate::pipeline::concurrent_search;

/// Classical single-threaded UCT: walk, expand, simulate and update in one
/// loop until the duration elapses or the tree reports itself solved.
///
/// A root without a single legal move answers immediately with its static
/// score and no moves.
///
/// # Panics
/// Panics when `policies` is empty.
pub fn confident_search<S: GameState>(
    root: &Arc<Node<S>>,
    policies: &[S::Policy],
    duration: Duration,
) -> Decision<S::Move> {
    assert!(!policies.is_empty(), "confident_search: no rollout policy");

    if !root.has_moves() {
        return Decision::with_score(root.state().score());
    }

    let deadline = Instant::now() + duration;

    grow_tree(root);

    let (done_src, done) = cancel_pair();
    let mut rng = rand::thread_rng();

    while Instant::now() < deadline && !root.is_solved() {
        let mut moves = MoveSequence::new();
        let mut score = 0.0;
        let mut node = Arc::clone(root);

        while node.is_expanded() {
            let next = node.downselect(&mut rng);
            if let Some(mv) = next.edge() {
                score += mv.score();
                moves.enqueue(mv.clone());
            }
            node = next;
        }

        if !node.is_terminal() && node.visits() > VISIT_THRESHOLD {
            if let Some(mv) = node.random_new_edge(&mut rng) {
                score += mv.score();
                moves.enqueue(mv.clone());
                node = Node::expand_one(&node, mv);
            }
        }

        let sampled = node.state().sample(&done, &policies[0]);
        let decision = Decision::from_moves(moves, score).join(sampled);
        node.update_tree(&decision);
    }

    done_src.cancel();
    root.best()
}

/// Splits the allowed thinking time into cycles and runs a fresh
/// concurrent search per cycle, trading accumulated knowledge for
/// re-randomised exploration. The best decision across cycles wins.
pub fn meta_search<S: GameState>(
    root: &Arc<Node<S>>,
    policies: &[S::Policy],
    duration: Duration,
) -> Decision<S::Move> {
    let mut best: Decision<S::Move> = Decision::new();

    for (i, cycle) in plan_cycles(duration).iter().enumerate() {
        let fresh = clone_root(root);
        let result = concurrent_search(&fresh, policies, *cycle);
        info!(
            cycle = i + 1,
            seconds = cycle.as_secs_f64(),
            score = result.score(),
            "meta cycle finished"
        );

        if best.moves().is_empty() || result.score() > best.score() {
            best = result;
        }
    }

    best
}

/// The cycle lengths a meta search of `duration` runs, residual last.
///
/// Long budgets are split evenly: four cycles beyond five slots, two
/// cycles beyond three. Anything shorter runs in slot-sized cycles with
/// whatever remains as a final shorter cycle.
pub fn plan_cycles(duration: Duration) -> Vec<Duration> {
    if duration.is_zero() {
        return Vec::new();
    }

    let cycle = if duration > 5 * SLOT {
        duration / 4
    } else if duration > 3 * SLOT {
        duration / 2
    } else {
        SLOT
    };

    let full = (duration.as_nanos() / cycle.as_nanos()) as u32;
    let residual = duration - cycle * full;

    let mut plan = vec![cycle; full as usize];
    if !residual.is_zero() {
        plan.push(residual);
    }
    plan
}
