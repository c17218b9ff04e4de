//! Monte-Carlo tree nodes for single-player searches.
//!
//! Every node owns its children and keeps a non-owning reference to its
//! parent, so the tree is a pure arborescence shared across workers behind
//! per-node spinlocks. Critical sections stay tiny: statistics updates and
//! child reordering, never rollouts or allocation-heavy work.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use tilefall_core::{Decision, GameState, Hand};

use crate::spin::SpinLock;
use crate::ucb::{self, selected_ucb};

static NODE_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Grand total of nodes created since the last reset.
pub fn node_count() -> usize {
    NODE_COUNT.load(Ordering::Relaxed)
}

/// Resets the global node counter.
pub fn node_count_reset() {
    NODE_COUNT.store(0, Ordering::Relaxed);
}

/// Where a node stands in the search cycle.
///
/// A node is up to date (`Idle`), went through selection and expansion
/// (`Walked`), is being simulated (`Simulating`) or has its outcome in
/// flight towards an updater (`Simulated`). Back-propagation resets it to
/// `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Idle,
    Walked,
    Simulating,
    Simulated,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Idle => "idle",
            Status::Walked => "walked",
            Status::Simulating => "simulating",
            Status::Simulated => "simulated",
        };
        write!(f, "{}", s)
    }
}

/// The mutable half of a node, guarded by its spinlock.
struct Inner<S: GameState> {
    status: Status,
    children: Vec<Arc<Node<S>>>,
    hand: Hand<S::Move>,
    best: Decision<S::Move>,
    solved: f64,
    value: f64,
    mean: f64,
    visits: f64,
    variance: f64,
    epsilon: f64,
}

/// A node of the search tree.
pub struct Node<S: GameState> {
    parent: Option<Weak<Node<S>>>,
    edge: Option<S::Move>,
    depth: usize,
    state: S,
    c: f64,
    w: f64,
    inner: SpinLock<Inner<S>>,
}

/// Allocates a root node over an initial position and the selection
/// constants every descendant will inherit.
pub fn new_root<S: GameState>(initial: S, epsilon: f64, c: f64, w: f64) -> Arc<Node<S>> {
    let hand = initial.legal_moves();
    Node::create(None, None, initial, hand, 0, epsilon, c, w)
}

/// Returns a memory-independent copy of a root, carrying over its best
/// decision so knowledge survives a tree reset.
pub fn clone_root<S: GameState>(root: &Arc<Node<S>>) -> Arc<Node<S>> {
    let clone = new_root(root.state().clone(), root.epsilon(), root.c, root.w);
    clone.inner.lock().best = root.best();
    clone
}

/// Expands every first-level move of a fresh root so the search always has
/// a valid answer, even when interrupted immediately. New children start
/// at `+∞` so each is selected at least once.
///
/// Calling it on an already grown root is a no-op.
///
/// # Panics
/// Panics when the root has neither moves nor children: searching a dead
/// position is a caller bug.
pub fn grow_tree<S: GameState>(root: &Arc<Node<S>>) {
    if root.is_expanded() {
        return;
    }
    assert!(root.hand_len() > 0, "grow_tree: root has no legal moves");
    Node::expand_all(root, f64::INFINITY);
}

impl<S: GameState> Node<S> {
    #[allow(clippy::too_many_arguments)]
    fn create(
        parent: Option<Weak<Node<S>>>,
        edge: Option<S::Move>,
        state: S,
        hand: Hand<S::Move>,
        depth: usize,
        epsilon: f64,
        c: f64,
        w: f64,
    ) -> Arc<Node<S>> {
        NODE_COUNT.fetch_add(1, Ordering::Relaxed);

        Arc::new(Node {
            parent,
            edge,
            depth,
            state,
            c,
            w,
            inner: SpinLock::new(Inner {
                status: Status::Idle,
                children: Vec::new(),
                hand,
                best: Decision::new(),
                solved: 0.0,
                value: 0.0,
                mean: 0.0,
                visits: 0.0,
                variance: 0.0,
                epsilon,
            }),
        })
    }

    /// Plays `mv`, allocates the resulting child and links it under `this`.
    pub fn expand_one(this: &Arc<Node<S>>, mv: S::Move) -> Arc<Node<S>> {
        let state = this.state.play(&mv);
        let hand = state.legal_moves();

        let child = Node::create(
            Some(Arc::downgrade(this)),
            Some(mv),
            state,
            hand,
            this.depth + 1,
            this.epsilon(),
            this.c,
            this.w,
        );

        this.inner.lock().children.push(Arc::clone(&child));
        child
    }

    /// Expands every move left in the hand, priming each child with
    /// `value`.
    pub fn expand_all(this: &Arc<Node<S>>, value: f64) {
        let hand = std::mem::take(&mut this.inner.lock().hand);
        for mv in hand {
            let child = Node::expand_one(this, mv);
            child.set_value(value);
        }
    }

    /// Chooses the next edge with linear ε-greedy selection: a random
    /// child with probability ε, the UCB ordering otherwise. The first
    /// child that is idle and whose lock is free wins.
    ///
    /// When every child is busy (oversampling), a uniformly random child
    /// is returned anyway and this node's ε doubles, injecting entropy to
    /// escape a saturated subtree.
    pub fn downselect<R: Rng>(&self, rng: &mut R) -> Arc<Node<S>> {
        let p = {
            let inner = self.inner.lock();
            if inner.visits > 0.0 {
                inner.epsilon
            } else {
                1.0
            }
        };
        let greedy = rng.gen::<f64>() > p;

        let mut inner = self.inner.lock();

        if greedy {
            // Reorder in place, best cached value first.
            let mut keyed: Vec<(f64, Arc<Node<S>>)> = inner
                .children
                .iter()
                .map(|child| (child.value(), Arc::clone(child)))
                .collect();
            keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
            inner.children = keyed.into_iter().map(|(_, child)| child).collect();
        } else {
            inner.children.shuffle(rng);
        }

        let mut picked: Option<Arc<Node<S>>> = None;
        for child in &inner.children {
            let status = match child.inner.try_lock() {
                Some(guard) => guard.status,
                None => continue,
            };
            if status == Status::Idle {
                picked = Some(Arc::clone(child));
                break;
            }
        }
        if let Some(child) = picked {
            // Excludes this branch from concurrent selections until an
            // updater restores its value.
            inner.value = f64::NEG_INFINITY;
            return child;
        }

        // Oversampling: every child is claimed by another worker.
        let pick = Arc::clone(&inner.children[rng.gen_range(0..inner.children.len())]);
        inner.epsilon *= 2.0;
        debug!(
            children = inner.children.len(),
            epsilon = inner.epsilon,
            "downselect oversampling, entropy increased"
        );
        pick
    }

    /// Removes and returns a random unexpanded move, if any is left.
    pub fn random_new_edge<R: Rng>(&self, rng: &mut R) -> Option<S::Move> {
        self.inner.lock().hand.draw(rng)
    }

    /// Back-propagates a simulated decision from this node to the root:
    /// visit counts, Welford mean and variance, and the best recorded
    /// decision, followed by a UCB refresh of the whole path.
    pub fn update_tree(&self, decision: &Decision<S::Move>) {
        self.apply(decision);

        let mut ancestors = Vec::with_capacity(self.depth);
        let mut up = self.parent_node();
        while let Some(node) = up {
            node.apply(decision);
            up = node.parent_node();
            ancestors.push(node);
        }

        // Refresh values root first so every child reads updated parent
        // visit counts.
        for node in ancestors.iter().rev() {
            node.evaluate();
        }
        self.evaluate();
    }

    fn apply(&self, decision: &Decision<S::Move>) {
        let mut inner = self.inner.lock();
        inner.visits += 1.0;

        let score = decision.score();

        // Running mean and variance after B. P. Welford; numerically
        // stable, see Knuth TAOCP vol. 2, 3rd edition, p. 232.
        let old = inner.mean;
        let mean = old + (score - old) / inner.visits;
        inner.variance += (score - old) * (score - mean);
        inner.mean = mean;

        if score > inner.best.score() {
            inner.best = decision.clone();
        }
    }

    /// Recomputes the cached UCB value under the active formula.
    pub fn evaluate(&self) -> f64 {
        let parent_visits = match self.parent_node() {
            Some(parent) => parent.visits(),
            None => 1.0,
        };

        let stats = {
            let inner = self.inner.lock();
            ucb::Stats {
                parent_visits,
                visits: inner.visits,
                mean: inner.mean,
                variance: inner.variance,
                best: inner.best.score(),
                c: self.c,
                w: self.w,
            }
        };

        let value = ucb::value(selected_ucb(), &stats);
        self.inner.lock().value = value;
        value
    }

    /// The move that produced this node, `None` at the root.
    pub fn edge(&self) -> Option<&S::Move> {
        self.edge.as_ref()
    }

    /// Distance from the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The cached position of this node.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// The parent node, while the tree is alive.
    pub fn parent_node(&self) -> Option<Arc<Node<S>>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// A snapshot of the children list.
    pub fn children(&self) -> Vec<Arc<Node<S>>> {
        self.inner.lock().children.clone()
    }

    /// Number of moves still waiting for expansion.
    pub fn hand_len(&self) -> usize {
        self.inner.lock().hand.len()
    }

    /// True when every legal move has been expanded.
    pub fn is_expanded(&self) -> bool {
        let inner = self.inner.lock();
        inner.hand.is_empty() && !inner.children.is_empty()
    }

    /// True for a leaf that still has moves to expand.
    pub fn is_fringe(&self) -> bool {
        let inner = self.inner.lock();
        inner.children.is_empty() && !inner.hand.is_empty()
    }

    /// True for a leaf within one move of the end of the game: the last
    /// move is played by the simulation step, which also scores it.
    pub fn is_terminal(&self) -> bool {
        let inner = self.inner.lock();
        inner.children.is_empty() && inner.hand.len() <= 1
    }

    /// Whether the subtree is proven optimal. Wired through the tree but
    /// never established by the current searches.
    pub fn is_solved(&self) -> bool {
        let inner = self.inner.lock();
        inner.solved / (inner.hand.len() + inner.children.len()) as f64 == 1.0
    }

    /// True when the position offers any move at all.
    pub fn has_moves(&self) -> bool {
        let inner = self.inner.lock();
        !inner.hand.is_empty() || !inner.children.is_empty()
    }

    /// The best decision recorded through this node so far.
    pub fn best(&self) -> Decision<S::Move> {
        self.inner.lock().best.clone()
    }

    /// Transitions `Walked → Simulating`. Any other starting status means
    /// another sampler got here first and the job must be dropped.
    pub fn claim_simulation(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.status == Status::Walked {
            inner.status = Status::Simulating;
            true
        } else {
            false
        }
    }

    pub fn status(&self) -> Status {
        self.inner.lock().status
    }

    pub fn set_status(&self, status: Status) {
        self.inner.lock().status = status;
    }

    pub fn value(&self) -> f64 {
        self.inner.lock().value
    }

    pub fn set_value(&self, value: f64) {
        self.inner.lock().value = value;
    }

    /// Simulations that ran through this node.
    pub fn visits(&self) -> f64 {
        self.inner.lock().visits
    }

    /// Running mean score.
    pub fn mean(&self) -> f64 {
        self.inner.lock().mean
    }

    /// Population variance. Meaningless before the first visit.
    pub fn variance(&self) -> f64 {
        let inner = self.inner.lock();
        inner.variance / inner.visits
    }

    /// Sample variance. Meaningless before the second visit.
    pub fn sample_variance(&self) -> f64 {
        let inner = self.inner.lock();
        inner.variance / (inner.visits - 1.0)
    }

    /// Running standard deviation.
    pub fn stdev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// The ε this node currently selects with.
    pub fn epsilon(&self) -> f64 {
        self.inner.lock().epsilon
    }
}

impl<S: GameState> fmt::Debug for Node<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Node")
            .field("depth", &self.depth)
            .field("status", &inner.status)
            .field("children", &inner.children.len())
            .field("hand", &inner.hand.len())
            .field("visits", &inner.visits)
            .field("mean", &inner.mean)
            .field("value", &inner.value)
            .field("best", &inner.best.score())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tilefall_board::Board;
    use tilefall_samegame::SameBoard;

    fn root_of(input: &str) -> Arc<Node<SameBoard>> {
        let state = SameBoard::from_board(Board::parse(input).unwrap());
        new_root(state, 0.03, 40.0, 0.0)
    }

    #[test]
    fn test_new_root_counts_nodes() {
        // Tests share the process-wide counter, so only check the delta.
        let before = node_count();
        let root = root_of("2 2\nRR\nRR\n");
        assert!(node_count() > before);
        assert_eq!(root.depth(), 0);
        assert!(root.edge().is_none());
        assert_eq!(root.hand_len(), 1);
        assert_eq!(root.status(), Status::Idle);
    }

    #[test]
    fn test_node_count_reset() {
        let _root = root_of("2 2\nRR\nRR\n");
        node_count_reset();
        let after = node_count();
        let _other = root_of("2 2\nRR\nRR\n");
        assert!(node_count() > after);
    }

    #[test]
    fn test_grow_tree_expands_every_move() {
        let root = root_of("3 3\nRRG\nRRG\nRRG\n");
        assert_eq!(root.hand_len(), 2);

        grow_tree(&root);

        assert_eq!(root.hand_len(), 0);
        let children = root.children();
        assert_eq!(children.len(), 2);
        for child in &children {
            assert_eq!(child.value(), f64::INFINITY);
            assert_eq!(child.depth(), 1);
            assert!(child.parent_node().is_some());
        }
        assert!(root.is_expanded());

        // Growing again is a no-op.
        grow_tree(&root);
        assert_eq!(root.children().len(), 2);
    }

    #[test]
    #[should_panic(expected = "no legal moves")]
    fn test_grow_tree_panics_without_moves() {
        let root = root_of("1 1\nR\n");
        grow_tree(&root);
    }

    #[test]
    fn test_node_predicates() {
        let root = root_of("3 3\nRRG\nRRG\nRRG\n");
        assert!(root.is_fringe());
        assert!(!root.is_expanded());
        assert!(!root.is_terminal());

        grow_tree(&root);
        assert!(root.is_expanded());
        assert!(!root.is_fringe());

        // The green child keeps a single red tile: terminal.
        let children = root.children();
        let terminal = children.iter().find(|c| c.hand_len() == 1).unwrap();
        assert!(terminal.is_terminal());
    }

    #[test]
    fn test_update_tree_welford() {
        let root = root_of("2 2\nRR\nRR\n");
        grow_tree(&root);
        let child = &root.children()[0];

        let scores = [4.0, 10.0, 7.0, 7.0, 100.0];
        for &s in &scores {
            child.update_tree(&Decision::with_score(s));
        }

        let k = scores.len() as f64;
        let mean: f64 = scores.iter().sum::<f64>() / k;
        let variance: f64 = scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / k;

        assert_eq!(child.visits(), k);
        assert!((child.mean() - mean).abs() < 1e-9);
        assert!((child.variance() - variance).abs() < 1e-9);
        // The update ran through to the root.
        assert_eq!(root.visits(), k);
        assert!((root.best().score() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_best_is_monotonic() {
        let root = root_of("2 2\nRR\nRR\n");
        let mut top = root.best().score();

        for &s in &[5.0, 3.0, 8.0, 1.0, 8.0, 20.0, 2.0] {
            root.update_tree(&Decision::with_score(s));
            let now = root.best().score();
            assert!(now >= top);
            top = now;
        }
        assert_eq!(top, 20.0);
    }

    #[test]
    fn test_downselect_picks_idle_child() {
        let root = root_of("3 3\nRRG\nRRG\nRRG\n");
        grow_tree(&root);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let picked = root.downselect(&mut rng);
        assert_eq!(picked.depth(), 1);
        assert_eq!(picked.status(), Status::Idle);
        // Selection hides the branch until back-propagation restores it.
        assert_eq!(root.value(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_downselect_oversampling_doubles_epsilon() {
        let root = root_of("3 3\nRRG\nRRG\nRRG\n");
        grow_tree(&root);
        for child in root.children() {
            child.set_status(Status::Walked);
        }

        let epsilon = root.epsilon();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let picked = root.downselect(&mut rng);

        assert_eq!(picked.depth(), 1);
        assert_eq!(root.epsilon(), epsilon * 2.0);
    }

    #[test]
    fn test_claim_simulation_single_winner() {
        let root = root_of("2 2\nRR\nRR\n");
        assert!(!root.claim_simulation());

        root.set_status(Status::Walked);
        assert!(root.claim_simulation());
        assert_eq!(root.status(), Status::Simulating);
        assert!(!root.claim_simulation());
    }

    #[test]
    fn test_clone_root_is_independent() {
        let root = root_of("2 2\nRR\nRR\n");
        root.update_tree(&Decision::with_score(12.0));
        grow_tree(&root);

        let clone = clone_root(&root);
        assert_eq!(clone.best().score(), 12.0);
        assert_eq!(clone.visits(), 0.0);
        assert!(clone.children().is_empty());
        assert_eq!(clone.hand_len(), 1);

        clone.update_tree(&Decision::with_score(50.0));
        assert_eq!(root.best().score(), 12.0);
        assert_eq!(root.visits(), 1.0);
    }

    #[test]
    fn test_random_new_edge_drains_hand() {
        let root = root_of("3 3\nRRG\nRRG\nRRG\n");
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        assert!(root.random_new_edge(&mut rng).is_some());
        assert!(root.random_new_edge(&mut rng).is_some());
        assert!(root.random_new_edge(&mut rng).is_none());
    }

    #[test]
    fn test_is_solved_stays_false() {
        let root = root_of("2 2\nRR\nRR\n");
        assert!(!root.is_solved());
        root.update_tree(&Decision::with_score(1004.0));
        assert!(!root.is_solved());
    }
}
