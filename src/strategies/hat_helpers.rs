use crate::game::*;
use crate::helpers::Tally;

/// Every clue stands for one residue of this modulus.
pub const ACTION_MODULUS: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModulusInformation {
    pub modulus: u32,
    pub value: u32,
}
impl ModulusInformation {
    pub fn new(modulus: u32, value: u32) -> Self {
        assert!(value < modulus);
        ModulusInformation { modulus, value }
    }

    pub fn zero() -> Self {
        Self::new(ACTION_MODULUS, 0)
    }

    pub fn add(&mut self, other: &Self) {
        assert!(self.modulus == other.modulus);
        self.value = (self.value + other.value) % self.modulus;
    }

    pub fn subtract(&mut self, other: &Self) {
        assert!(self.modulus == other.modulus);
        self.value = (self.modulus + self.value - other.value) % self.modulus;
    }
}

/// The nine instructions a clue can assign to a player.
///
/// Slots count from the oldest card, which is slot 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HatAction {
    Hint,
    Play(usize),
    Discard(usize),
}
impl HatAction {
    /// 0 is a hint, 1..=4 play slots 3..=0, 5..=8 discard slots 3..=0.
    pub fn number(self) -> u32 {
        match self {
            HatAction::Hint => 0,
            HatAction::Play(slot) => 4 - slot as u32,
            HatAction::Discard(slot) => 8 - slot as u32,
        }
    }

    pub fn from_number(number: u32) -> HatAction {
        match number % ACTION_MODULUS {
            0 => HatAction::Hint,
            n @ 1..=4 => HatAction::Play((4 - n) as usize),
            n => HatAction::Discard((8 - n) as usize),
        }
    }

    pub fn info(self) -> ModulusInformation {
        ModulusInformation::new(ACTION_MODULUS, self.number())
    }

    pub fn is_play(self) -> bool {
        matches!(self, HatAction::Play(_))
    }

    pub fn is_discard(self) -> bool {
        matches!(self, HatAction::Discard(_))
    }

    pub fn slot(self) -> Option<usize> {
        match self {
            HatAction::Hint => None,
            HatAction::Play(slot) | HatAction::Discard(slot) => Some(slot),
        }
    }
}

/// Whether `player` sits in `begin..=end`, walking in turn order.
pub fn is_between_inclusive(player: Player, begin: Player, end: Player, num_players: u32) -> bool {
    (player + num_players - begin) % num_players <= (end + num_players - begin) % num_players
}

/// Decodes a clue into its residue.
///
/// With 4 players a rank clue touching the target's newest card is 0, a color
/// clue touching it is 1 and a clue missing it is 2; each player skipped
/// between the cluer and the target adds 3. With 5 players any clue missing
/// the newest card is 8, and each skipped player adds 2.
pub fn clue_to_number(
    cluer: Player,
    target: Player,
    hinted: &Hinted,
    touched_newest: bool,
    num_players: u32,
) -> u32 {
    let x = if !touched_newest {
        2
    } else if let Hinted::Color(_) = hinted {
        1
    } else {
        0
    };
    let skipped = (target + num_players - cluer - 1) % num_players;
    if num_players == 4 {
        3 * skipped + x
    } else if x == 2 {
        8
    } else {
        2 * skipped + x
    }
}

/// A clue for `cards` that misses the newest card, if one exists.
///
/// Scans from the oldest card: a differing rank wins, then a differing
/// ordinary color. A wild card is touched by naming red, or yellow when the
/// newest card is red.
pub fn clue_not_newest(cards: &[Card], variant: Variant) -> Option<Hinted> {
    let (newest, older) = cards.split_last()?;
    for card in older {
        if card.value != newest.value {
            return Some(Hinted::Value(card.value));
        }
        if card.color != newest.color && !variant.is_wild(newest.color) {
            if !variant.is_wild(card.color) {
                return Some(Hinted::Color(card.color));
            }
            if newest.color != VANILLA_COLORS[0] {
                return Some(Hinted::Color(VANILLA_COLORS[0]));
            }
            return Some(Hinted::Color(VANILLA_COLORS[1]));
        }
    }
    None
}

/// Encodes a residue as a concrete clue from `view.me()`.
///
/// Falls back to a rank clue on the newest card when no clue can miss it,
/// recording "clue blocked".
pub fn number_to_clue(value: u32, view: &PlayerView<'_>, tally: &mut Tally) -> Option<Hint> {
    let num_players = view.board.opts.num_players;
    let variant = view.board.opts.variant;
    let me = view.me();

    if num_players != 4 && value == 8 {
        for target in view.other_players() {
            if let Some(hinted) = clue_not_newest(&view.hand(target), variant) {
                return Some(Hint {
                    player: target,
                    hinted,
                });
            }
        }
        tally.record("clue blocked");
        let target = view.board.player_to_left(me);
        let newest = *view.hand(target).last()?;
        return Some(Hint {
            player: target,
            hinted: Hinted::Value(newest.value),
        });
    }

    let (target, x) = if num_players == 4 {
        ((me + 1 + value / 3) % num_players, value % 3)
    } else {
        ((me + 1 + value / 2) % num_players, value % 2)
    };
    let cards = view.hand(target);
    let newest = *cards.last()?;
    let hinted = match x {
        0 => Hinted::Value(newest.value),
        1 if variant.is_wild(newest.color) => Hinted::Color(VANILLA_COLORS[2]),
        1 => Hinted::Color(newest.color),
        _ => match clue_not_newest(&cards, variant) {
            Some(hinted) => hinted,
            None => {
                tally.record("clue blocked");
                Hinted::Value(newest.value)
            }
        },
    };
    Some(Hint {
        player: target,
        hinted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::new_deck;

    #[test]
    fn action_numbering_is_a_bijection() {
        for number in 0..ACTION_MODULUS {
            assert_eq!(HatAction::from_number(number).number(), number);
        }
        assert_eq!(HatAction::Play(3).number(), 1);
        assert_eq!(HatAction::Play(0).number(), 4);
        assert_eq!(HatAction::Discard(3).number(), 5);
        assert_eq!(HatAction::Discard(0).number(), 8);
    }

    #[test]
    fn modular_arithmetic_wraps() {
        let mut value = HatAction::Discard(0).info();
        value.add(&HatAction::Play(2).info());
        assert_eq!(value.value, 1);
        value.subtract(&HatAction::Discard(1).info());
        assert_eq!(value.value, 3);
    }

    #[test]
    fn seats_between_wrap_around() {
        assert!(is_between_inclusive(0, 3, 1, 4));
        assert!(is_between_inclusive(3, 3, 1, 4));
        assert!(!is_between_inclusive(2, 3, 1, 4));
        assert!(is_between_inclusive(2, 2, 2, 5));
    }

    #[test]
    fn clues_that_miss_the_newest_card() {
        let cards = [Card::new('r', 2), Card::new('b', 2), Card::new('r', 2)];
        assert_eq!(
            clue_not_newest(&cards, Variant::NoVariant),
            Some(Hinted::Color('b'))
        );
        let same = [Card::new('g', 4), Card::new('g', 4)];
        assert_eq!(clue_not_newest(&same, Variant::NoVariant), None);
        let wild_older = [Card::new(RAINBOW, 1), Card::new('r', 1)];
        assert_eq!(
            clue_not_newest(&wild_older, Variant::Rainbow),
            Some(Hinted::Color('y'))
        );
        let wild_newest = [Card::new('r', 1), Card::new(RAINBOW, 1)];
        assert_eq!(clue_not_newest(&wild_newest, Variant::Rainbow), None);
    }

    fn round_trip(num_players: u32, variant: Variant, seed: u64) {
        let opts = GameOptions::new(num_players, variant);
        let game = GameState::new(&opts, new_deck(variant, seed));
        for me in game.get_players() {
            let view = game.get_view(me);
            for value in 0..ACTION_MODULUS {
                let mut tally = Tally::new();
                let hint = number_to_clue(value, &view, &mut tally).unwrap();
                assert_ne!(hint.player, me);
                let hand = view.hand(hint.player);
                let touched_newest = hand.last().unwrap().matches(&hint.hinted, variant);
                let decoded =
                    clue_to_number(me, hint.player, &hint.hinted, touched_newest, num_players);
                if tally.get("clue blocked") == 0 {
                    assert_eq!(decoded, value, "seat {} encoding {} as {:?}", me, value, hint);
                }
            }
        }
    }

    #[test]
    fn every_residue_decodes_to_itself() {
        for seed in 0..20 {
            round_trip(4, Variant::NoVariant, seed);
            round_trip(5, Variant::NoVariant, seed);
            round_trip(4, Variant::Rainbow, seed);
            round_trip(5, Variant::Purple, seed);
        }
    }
}
