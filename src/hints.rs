use std::fmt;

use crate::cards::{Card, CardCounts, Hinted, Variant};

pub type CardId = u32;

/// Public record of the clues a card has received while in hand.
///
/// Token lists are append-only and `known` is never lowered, so a ledger
/// entry only ever gains information until its card leaves the hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardKnowledge {
    pub id: CardId,
    pub drawn_turn: u32,
    direct: Vec<Hinted>,
    indirect: Vec<Hinted>,
    known: bool,
}
impl CardKnowledge {
    pub fn new(id: CardId, drawn_turn: u32) -> CardKnowledge {
        CardKnowledge {
            id,
            drawn_turn,
            direct: Vec::new(),
            indirect: Vec::new(),
            known: false,
        }
    }

    pub fn direct(&self) -> &[Hinted] {
        &self.direct
    }

    pub fn indirect(&self) -> &[Hinted] {
        &self.indirect
    }

    pub fn is_known(&self) -> bool {
        self.known
    }

    pub fn is_touched(&self) -> bool {
        !self.direct.is_empty()
    }

    pub fn mark(&mut self, hinted: Hinted, matched: bool) {
        if matched {
            self.direct.push(hinted);
        } else {
            self.indirect.push(hinted);
        }
    }

    /// Whether `card` is consistent with every token received so far.
    pub fn allows(&self, card: &Card, variant: Variant) -> bool {
        self.direct.iter().all(|hinted| card.matches(hinted, variant))
            && self.indirect.iter().all(|hinted| !card.matches(hinted, variant))
    }

    /// Identities consistent with the tokens and with the copies not yet
    /// publicly accounted for (`public` counts discarded and played cards).
    pub fn possible_cards(&self, variant: Variant, public: &CardCounts) -> Vec<Card> {
        variant
            .all_cards()
            .filter(|card| public.remaining(card) > 0 && self.allows(card, variant))
            .collect()
    }

    /// Raises the `known` flag once public information pins down the card.
    pub fn refresh_known(&mut self, variant: Variant, public: &CardCounts) -> bool {
        if !self.known && self.possible_cards(variant, public).len() == 1 {
            self.known = true;
        }
        self.known
    }
}
impl fmt::Display for CardKnowledge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.id)?;
        for hinted in &self.direct {
            write!(f, " +{}", hinted)?;
        }
        for hinted in &self.indirect {
            write!(f, " -{}", hinted)?;
        }
        if self.known {
            f.write_str(" (known)")?;
        }
        Ok(())
    }
}
