//! The decoupled concurrent search pipeline.
//!
//! Instead of threads each running a full select/expand/simulate/update
//! cycle, the work is split across three role-specialised pools connected
//! by bounded channels:
//!
//! ```text
//! walkers --(positions)--> samplers --(outcomes)--> updaters
//! ```
//!
//! Walkers descend the tree and occasionally expand it, samplers play full
//! random games, updaters back-propagate the results. The channel bounds
//! propagate pressure backwards: when samplers stall, walkers block and the
//! tree stops growing. A broadcast `done` channel tears the whole pipeline
//! down, and the thread scope waits for every worker before returning.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, Receiver, Sender};
use tracing::trace;

use tilefall_core::{Cancel, cancel_pair, Decision, GameState, Move, MoveSequence};

use crate::config::{WorkerPools, VISIT_THRESHOLD};
use crate::node::{grow_tree, Node, Status};

/// A unit of work in flight between two pipeline stages: a node and the
/// decision accumulated for it so far.
struct Job<S: GameState> {
    node: Arc<Node<S>>,
    decision: Decision<S::Move>,
}

/// Searches `root` with the pipelined concurrent strategy until the
/// duration elapses or the tree reports itself solved, then returns the
/// best decision recorded at the root.
///
/// A root without a single legal move answers immediately with its static
/// score and no moves.
///
/// # Panics
/// Panics when `policies` is empty: the simulation step needs one.
pub fn concurrent_search<S: GameState>(
    root: &Arc<Node<S>>,
    policies: &[S::Policy],
    duration: Duration,
) -> Decision<S::Move> {
    assert!(!policies.is_empty(), "concurrent_search: no rollout policy");

    if !root.has_moves() {
        return Decision::with_score(root.state().score());
    }

    // The countdown starts before the pipeline: a late decision is as good
    // as an illegal move.
    let deadline = Instant::now() + duration;

    grow_tree(root);

    let pools = WorkerPools::detect();
    let (done_src, done) = cancel_pair();
    let (position_tx, position_rx) = bounded::<Job<S>>(pools.samplers);
    let (outcome_tx, outcome_rx) = bounded::<Job<S>>(pools.samplers);

    std::thread::scope(|scope| {
        for _ in 0..pools.walkers {
            let done = done.clone();
            let positions = position_tx.clone();
            scope.spawn(move || walker(&done, root, &positions));
        }
        for _ in 0..pools.samplers {
            let done = done.clone();
            let positions = position_rx.clone();
            let outcomes = outcome_tx.clone();
            let policy = &policies[0];
            scope.spawn(move || sampler(&done, policy, &positions, &outcomes));
        }
        for _ in 0..pools.updaters {
            let done = done.clone();
            let outcomes = outcome_rx.clone();
            scope.spawn(move || updater(&done, &outcomes));
        }
        // Workers hold their own clones; dropping ours lets the channels
        // close once the walkers exit.
        drop((position_tx, position_rx, outcome_tx, outcome_rx));

        // Supervise until the deadline fires or the root proves itself.
        while Instant::now() < deadline && !root.is_solved() {
            std::thread::sleep(Duration::from_millis(1));
        }

        // Broadcast termination and let the scope join every worker.
        done_src.cancel();
    });

    root.best()
}

/// A walker repeatedly descends the tree from the root, selecting through
/// fully expanded nodes and growing one new child once a leaf has absorbed
/// enough simulations, then hands the reached node to the samplers.
fn walker<S: GameState>(done: &Cancel, root: &Arc<Node<S>>, positions: &Sender<Job<S>>) {
    trace!("walker up");
    let mut rng = rand::thread_rng();

    loop {
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

        node.set_status(Status::Walked);
        let job = Job {
            node,
            decision: Decision::from_moves(moves, score),
        };

        select! {
            recv(done.receiver()) -> _ => {
                trace!("walker done");
                return;
            }
            send(positions, job) -> sent => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}

/// A sampler claims a walked node, plays one full random game from its
/// position and forwards the completed decision. Samplers are the slowest
/// stage, which is why the pipeline runs twice as many of them.
fn sampler<S: GameState>(
    done: &Cancel,
    policy: &S::Policy,
    positions: &Receiver<Job<S>>,
    outcomes: &Sender<Job<S>>,
) {
    trace!("sampler up");

    loop {
        let Job { node, decision } = select! {
            recv(done.receiver()) -> _ => {
                trace!("sampler done");
                return;
            }
            recv(positions) -> msg => match msg {
                Ok(job) => job,
                Err(_) => return,
            },
        };

        let state = node.state().clone();

        // Another sampler may already own this node; its job is stale.
        if !node.claim_simulation() {
            continue;
        }

        let sampled = decision.join(state.sample(done, policy));
        let job = Job {
            node: Arc::clone(&node),
            decision: sampled,
        };

        select! {
            recv(done.receiver()) -> _ => {
                trace!("sampler done");
                return;
            }
            send(outcomes, job) -> sent => {
                if sent.is_ok() {
                    node.set_status(Status::Simulated);
                } else {
                    return;
                }
            }
        }
    }
}

/// An updater back-propagates sampled outcomes along the ancestor chain
/// and releases the node for reselection.
fn updater<S: GameState>(done: &Cancel, outcomes: &Receiver<Job<S>>) {
    trace!("updater up");

    loop {
        let job = select! {
            recv(done.receiver()) -> _ => {
                trace!("updater done");
                return;
            }
            recv(outcomes) -> msg => match msg {
                Ok(job) => job,
                Err(_) => return,
            },
        };

        job.node.update_tree(&job.decision);
        job.node.set_status(Status::Idle);
    }
}
