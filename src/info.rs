use fnv::FnvHashMap;
use std::fmt;

use crate::game::{BoardState, Card, CardCounts, CardKnowledge, Variant};

// Can represent information of the form:
// this card is/isn't possible
// also, maintains integer weights for the cards
#[derive(Clone, Debug)]
pub struct CardPossibilityTable {
    possible: FnvHashMap<Card, u32>,
}
impl CardPossibilityTable {
    /// Weights every identity by its copies not yet accounted for in `counts`.
    pub fn from_counts(variant: Variant, counts: &CardCounts) -> CardPossibilityTable {
        let possible = variant
            .all_cards()
            .filter_map(|card| {
                let count = counts.remaining(&card);
                if count > 0 {
                    Some((card, count))
                } else {
                    None
                }
            })
            .collect();
        CardPossibilityTable { possible }
    }

    /// Table for a card in hand, restricted by the clues it received.
    pub fn for_card(
        knowledge: &CardKnowledge,
        variant: Variant,
        counts: &CardCounts,
    ) -> CardPossibilityTable {
        let mut table = Self::from_counts(variant, counts);
        table
            .possible
            .retain(|card, _| knowledge.allows(card, variant));
        table
    }

    // whether the card is possible
    pub fn is_possible(&self, card: &Card) -> bool {
        self.possible.contains_key(card)
    }

    pub fn get_possibilities(&self) -> Vec<Card> {
        let mut cards = self.possible.keys().copied().collect::<Vec<_>>();
        cards.sort();
        cards
    }

    pub fn is_empty(&self) -> bool {
        self.possible.is_empty()
    }

    // mark a possible card as false
    pub fn mark_false(&mut self, card: &Card) {
        self.possible.remove(card);
    }

    pub fn decrement_weight_if_possible(&mut self, card: &Card) {
        if let Some(weight) = self.possible.get_mut(card) {
            *weight -= 1;
            if *weight == 0 {
                self.possible.remove(card);
            }
        }
    }

    pub fn get_card(&self) -> Option<Card> {
        if self.possible.len() == 1 {
            self.possible.keys().next().copied()
        } else {
            None
        }
    }

    pub fn is_determined(&self) -> bool {
        self.possible.len() == 1
    }

    // get probability weight for the card
    fn get_weight(&self, card: &Card) -> f32 {
        *self.possible.get(card).unwrap_or(&0) as f32
    }

    pub fn total_weight(&self) -> f32 {
        self.possible.values().map(|&weight| weight as f32).sum()
    }

    pub fn weighted_score<T>(&self, score_fn: &dyn Fn(&Card) -> T) -> f32
    where
        f32: From<T>,
    {
        let mut total_score = 0.;
        let mut total_weight = 0.;
        for card in self.get_possibilities() {
            let weight = self.get_weight(&card);
            let score = f32::from(score_fn(&card));
            total_weight += weight;
            total_score += weight * score;
        }
        if total_weight == 0. {
            0.
        } else {
            total_score / total_weight
        }
    }

    pub fn average_value(&self) -> f32 {
        self.weighted_score(&|card| card.value as f32)
    }

    pub fn probability_of_predicate(&self, predicate: &dyn Fn(&Card) -> bool) -> f32 {
        let f = |card: &Card| {
            if predicate(card) {
                1.0f32
            } else {
                0.0
            }
        };
        self.weighted_score(&f)
    }

    pub fn probability_is_playable(&self, board: &BoardState) -> f32 {
        self.probability_of_predicate(&|card| board.is_playable(card))
    }

    pub fn probability_is_dead(&self, board: &BoardState) -> f32 {
        self.probability_of_predicate(&|card| board.is_dead(card))
    }

    pub fn probability_is_dispensable(&self, board: &BoardState) -> f32 {
        self.probability_of_predicate(&|card| board.is_dispensable(card))
    }
}
impl fmt::Display for CardPossibilityTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for card in self.get_possibilities() {
            write!(f, "{} {}, ", self.possible[&card], card)?;
        }
        Ok(())
    }
}
