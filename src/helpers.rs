use fnv::FnvHashMap;
use std::fmt;

use crate::cards::Card;

mod per_player;

pub use per_player::PerPlayer;

/// First candidate slot holding the lowest rank.
pub fn lowest_value_index(
    cards: &[Card],
    candidates: impl IntoIterator<Item = usize>,
) -> Option<usize> {
    let mut best: Option<usize> = None;
    for index in candidates {
        match best {
            Some(b) if cards[b].value <= cards[index].value => {}
            _ => best = Some(index),
        }
    }
    best
}

/// First candidate slot holding the highest rank.
pub fn highest_value_index(
    cards: &[Card],
    candidates: impl IntoIterator<Item = usize>,
) -> Option<usize> {
    let mut best: Option<usize> = None;
    for index in candidates {
        match best {
            Some(b) if cards[b].value >= cards[index].value => {}
            _ => best = Some(index),
        }
    }
    best
}

/// Named counters for situations a strategy handles with a fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: FnvHashMap<&'static str, u32>,
}
impl Tally {
    pub fn new() -> Tally {
        Tally::default()
    }

    pub fn record(&mut self, label: &'static str) {
        *self.counts.entry(label).or_insert(0) += 1;
    }

    pub fn get(&self, label: &str) -> u32 {
        *self.counts.get(label).unwrap_or(&0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn merge(&mut self, other: &Tally) {
        for (&label, &count) in &other.counts {
            *self.counts.entry(label).or_insert(0) += count;
        }
    }

    pub fn sorted(&self) -> Vec<(&'static str, u32)> {
        let mut entries = self
            .counts
            .iter()
            .map(|(&label, &count)| (label, count))
            .collect::<Vec<_>>();
        entries.sort();
        entries
    }
}
impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (label, count) in self.sorted() {
            writeln!(f, "  {}: {}", label, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tallies_merge() {
        let mut a = Tally::new();
        a.record("clue blocked");
        a.record("clue blocked");
        let mut b = Tally::new();
        b.record("clue blocked");
        b.record("I misplayed");
        a.merge(&b);
        assert_eq!(a.get("clue blocked"), 3);
        assert_eq!(a.get("I misplayed"), 1);
        assert_eq!(a.get("never happened"), 0);
        assert_eq!(a.sorted()[0], ("I misplayed", 1));
    }

    #[test]
    fn value_indices_take_the_first_extreme() {
        let cards = [
            Card::new('r', 2),
            Card::new('y', 4),
            Card::new('g', 4),
            Card::new('b', 2),
        ];
        assert_eq!(highest_value_index(&cards, 0..cards.len()), Some(1));
        assert_eq!(lowest_value_index(&cards, 0..cards.len()), Some(0));
        assert_eq!(lowest_value_index(&cards, vec![2, 3, 1]), Some(3));
        assert_eq!(highest_value_index(&cards, vec![3, 2]), Some(2));
        assert_eq!(highest_value_index(&cards, None), None);
    }

    #[test]
    fn per_player_indexing() {
        let mut seats = PerPlayer::new(3, |player| player * 10);
        seats[2] += 1;
        assert_eq!(seats[2], 21);
        assert_eq!(seats.iter().map(|(_, &v)| v).sum::<u32>(), 31);
        let failed: Result<PerPlayer<u32>, &str> =
            PerPlayer::try_new(3, |player| if player == 1 { Err("no") } else { Ok(player) });
        assert_eq!(failed, Err("no"));
    }
}
