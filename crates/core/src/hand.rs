use rand::Rng;

/// The legal moves of a position that have not been expanded yet.
///
/// A hand is drained in random order: expansion draws one move at a time
/// without caring which.
#[derive(Clone, Debug)]
pub struct Hand<M> {
    moves: Vec<M>,
}

impl<M> Hand<M> {
    /// An empty hand.
    pub fn new() -> Self {
        Hand { moves: Vec::new() }
    }

    /// Removes and returns a uniformly chosen move, or `None` when empty.
    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Option<M> {
        if self.moves.is_empty() {
            return None;
        }
        let i = rng.gen_range(0..self.moves.len());
        Some(self.moves.swap_remove(i))
    }

    /// Number of moves left in the hand.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// True when nothing is left to expand.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Iterates over the remaining moves.
    pub fn iter(&self) -> impl Iterator<Item = &M> {
        self.moves.iter()
    }
}

impl<M> Default for Hand<M> {
    fn default() -> Self {
        Hand::new()
    }
}

impl<M> From<Vec<M>> for Hand<M> {
    fn from(moves: Vec<M>) -> Self {
        Hand { moves }
    }
}

impl<M> FromIterator<M> for Hand<M> {
    fn from_iter<I: IntoIterator<Item = M>>(iter: I) -> Self {
        Hand {
            moves: iter.into_iter().collect(),
        }
    }
}

impl<M> IntoIterator for Hand<M> {
    type Item = M;
    type IntoIter = std::vec::IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_draw_removes() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut hand: Hand<u8> = vec![1, 2, 3].into();

        let mut drawn = Vec::new();
        while let Some(m) = hand.draw(&mut rng) {
            drawn.push(m);
        }

        assert!(hand.is_empty());
        drawn.sort_unstable();
        assert_eq!(drawn, vec![1, 2, 3]);
    }

    #[test]
    fn test_draw_from_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut hand: Hand<u8> = Hand::new();
        assert_eq!(hand.draw(&mut rng), None);
    }
}
