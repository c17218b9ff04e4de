//! Property-based tests for the search tree invariants:
//! statistics correctness, monotonic best decisions, bootstrap shape,
//! tree ownership and the legality of returned sequences.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tilefall_board::{Board, Color};
use tilefall_core::{Decision, GameState};
use tilefall_mcts::{confident_search, grow_tree, new_root, Node, Status};
use tilefall_samegame::{taboo_color, ColorPolicy, Move, SameBoard};

fn uniform_root() -> Arc<Node<SameBoard>> {
    let board = Board::parse("2 2\nRR\nRR\n").unwrap();
    new_root(SameBoard::from_board(board), 0.03, 40.0, 0.0)
}

fn random_board(h: usize, w: usize, colors: usize, seed: u64) -> SameBoard {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut board = SameBoard::new(h, w);
    board.randomize(&Color::ALL[..colors], &mut rng);
    board
}

// =============================================================================
// Welford statistics
// =============================================================================

proptest! {
    /// After k updates the running mean and population variance agree
    /// with the two-pass computation to within 1e-9.
    #[test]
    fn prop_welford_matches_naive(scores in prop::collection::vec(-100.0f64..100.0, 1..64)) {
        let root = uniform_root();
        for &s in &scores {
            root.update_tree(&Decision::with_score(s));
        }

        let k = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / k;
        let variance = scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / k;

        prop_assert_eq!(root.visits(), k);
        prop_assert!((root.mean() - mean).abs() < 1e-9);
        prop_assert!((root.variance() - variance).abs() < 1e-9);

        if scores.len() > 1 {
            let sample = scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / (k - 1.0);
            prop_assert!((root.sample_variance() - sample).abs() < 1e-9);
        }
    }

    /// The best score recorded at a node never decreases.
    #[test]
    fn prop_best_is_monotonic(scores in prop::collection::vec(-1000.0f64..2000.0, 1..64)) {
        let root = uniform_root();
        let mut top = root.best().score();

        for &s in &scores {
            root.update_tree(&Decision::with_score(s));
            let now = root.best().score();
            prop_assert!(now >= top, "best went from {} to {}", top, now);
            top = now;
        }
    }
}

// =============================================================================
// Bootstrap
// =============================================================================

proptest! {
    /// Growing a fresh root expands exactly its hand, primes every child
    /// at +inf and leaves nothing to expand.
    #[test]
    fn prop_bootstrap_shape(seed in any::<u64>(), h in 2usize..6, w in 2usize..6) {
        let state = random_board(h, w, 3, seed);
        let moves = state.legal_moves().len();
        prop_assume!(moves > 0);

        let root = new_root(state, 0.03, 40.0, 0.0);
        grow_tree(&root);

        prop_assert_eq!(root.hand_len(), 0);
        let children = root.children();
        prop_assert_eq!(children.len(), moves);
        for child in &children {
            prop_assert_eq!(child.value(), f64::INFINITY);
            prop_assert_eq!(child.status(), Status::Idle);
        }
    }
}

// =============================================================================
// Tree shape and result legality after a real search
// =============================================================================

fn mixed_board() -> SameBoard {
    samegame("5 5\nRRGGB\nRGGBB\nYYRGB\nYRRGG\nBBYYR\n")
}

fn samegame(input: &str) -> SameBoard {
    SameBoard::from_board(Board::parse(input).unwrap())
}

fn searched_root() -> Arc<Node<SameBoard>> {
    let root = new_root(mixed_board(), 0.03, 0.012, 0.0);
    let policies: Vec<ColorPolicy> = vec![taboo_color];
    let _ = confident_search(&root, &policies, Duration::from_millis(100));
    root
}

#[test]
fn test_tree_is_an_arborescence() {
    let root = searched_root();

    let mut seen: HashSet<*const Node<SameBoard>> = HashSet::new();
    let mut stack = vec![Arc::clone(&root)];

    while let Some(node) = stack.pop() {
        assert!(
            seen.insert(Arc::as_ptr(&node)),
            "node reached twice: the tree has a cycle or a shared child"
        );
        for child in node.children() {
            let parent = child.parent_node().expect("child outlived its parent");
            assert!(
                Arc::ptr_eq(&parent, &node),
                "child does not point back at its parent"
            );
            assert_eq!(child.depth(), node.depth() + 1);
            stack.push(child);
        }
    }

    assert!(seen.len() > 1, "the search never grew the tree");
}

#[test]
fn test_statuses_settle_after_synchronous_search() {
    let root = searched_root();

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        assert_eq!(node.status(), Status::Idle);
        stack.extend(node.children());
    }
}

#[test]
fn test_returned_sequence_is_legal() {
    let state = mixed_board();
    let root = new_root(state.clone(), 0.03, 0.012, 0.0);
    let policies: Vec<ColorPolicy> = vec![taboo_color];
    let best = confident_search(&root, &policies, Duration::from_millis(200));

    let mut current = state;
    for mv in best.moves().iter() {
        let legal = current.legal_moves();
        assert!(
            legal.iter().any(|m: &Move| m == mv),
            "move {} is not legal in its position",
            mv
        );
        current = current.play(mv);
    }
}
