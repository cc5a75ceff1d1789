use fnv::FnvHashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::GameError;

pub type Color = char;
pub const VANILLA_COLORS: [Color; 5] = ['r', 'y', 'g', 'b', 'w'];
// ordinary sixth suit
pub const PURPLE: Color = 'p';
// wild sixth suit, touched by every color clue
pub const RAINBOW: Color = 'm';

const PURPLE_COLORS: [Color; 6] = ['r', 'y', 'g', 'b', 'w', PURPLE];
const RAINBOW_COLORS: [Color; 6] = ['r', 'y', 'g', 'b', 'w', RAINBOW];

pub type Value = u32;
// list of values, assumed to be small to large
pub const VALUES: [Value; 5] = [1, 2, 3, 4, 5];
pub const FINAL_VALUE: Value = 5;

pub fn get_count_for_value(value: Value) -> u32 {
    match value {
        1 => 3,
        2 | 3 | 4 => 2,
        5 => 1,
        _ => {
            panic!("Unexpected value: {}", value);
        }
    }
}

pub type Score = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Card {
    pub color: Color,
    pub value: Value,
}
impl Card {
    pub fn new(color: Color, value: Value) -> Card {
        Card { color, value }
    }

    /// Whether a clue naming `hinted` touches this card.
    pub fn matches(&self, hinted: &Hinted, variant: Variant) -> bool {
        match *hinted {
            Hinted::Color(color) => self.color == color || variant.is_wild(self.color),
            Hinted::Value(value) => self.value == value,
        }
    }
}
impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.color, self.value)
    }
}

pub type Cards = Vec<Card>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hinted {
    Color(Color),
    Value(Value),
}
impl fmt::Display for Hinted {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Hinted::Color(color) => write!(f, "{}", color),
            Hinted::Value(value) => write!(f, "{}", value),
        }
    }
}

/// The suit layout of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    #[default]
    NoVariant,
    Purple,
    Rainbow,
}
impl Variant {
    pub fn colors(self) -> &'static [Color] {
        match self {
            Variant::NoVariant => &VANILLA_COLORS,
            Variant::Purple => &PURPLE_COLORS,
            Variant::Rainbow => &RAINBOW_COLORS,
        }
    }

    /// Colors a clue may name. The wild suit is never named directly.
    pub fn clue_colors(self) -> &'static [Color] {
        match self {
            Variant::Rainbow => &VANILLA_COLORS,
            _ => self.colors(),
        }
    }

    pub fn is_wild(self, color: Color) -> bool {
        self == Variant::Rainbow && color == RAINBOW
    }

    pub fn color_index(self, color: Color) -> Option<usize> {
        self.colors().iter().position(|&c| c == color)
    }

    pub fn total_cards(self) -> u32 {
        let per_color: u32 = VALUES.iter().map(|&value| get_count_for_value(value)).sum();
        per_color * self.colors().len() as u32
    }

    pub fn perfect_score(self) -> Score {
        FINAL_VALUE * self.colors().len() as Score
    }

    /// Distinct card identities, in color-major order.
    pub fn all_cards(self) -> impl Iterator<Item = Card> {
        self.colors()
            .iter()
            .flat_map(|&color| VALUES.iter().map(move |&value| Card::new(color, value)))
    }

    /// Name understood by the replay viewer.
    pub fn name(self) -> &'static str {
        match self {
            Variant::NoVariant => "No Variant",
            Variant::Purple => "6 Suits",
            Variant::Rainbow => "Rainbow (6 Suits)",
        }
    }
}
impl FromStr for Variant {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vanilla" | "none" => Ok(Variant::NoVariant),
            "purple" => Ok(Variant::Purple),
            "rainbow" => Ok(Variant::Rainbow),
            _ => Err(GameError::BadOption(format!(
                "unknown variant {:?}, expected vanilla, purple or rainbow",
                s
            ))),
        }
    }
}
impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct CardCounts {
    counts: FnvHashMap<Card, u32>,
    variant: Variant,
}
impl CardCounts {
    pub fn new(variant: Variant) -> CardCounts {
        let counts = variant.all_cards().map(|card| (card, 0)).collect();
        CardCounts { counts, variant }
    }

    pub fn get_count(&self, card: &Card) -> u32 {
        *self.counts.get(card).unwrap_or(&0)
    }

    pub fn remaining(&self, card: &Card) -> u32 {
        get_count_for_value(card.value).saturating_sub(self.get_count(card))
    }

    pub fn increment(&mut self, card: &Card) {
        *self.counts.entry(*card).or_insert(0) += 1;
    }
}
impl fmt::Display for CardCounts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &color in self.variant.colors() {
            write!(f, "{}: ", color)?;
            for &value in VALUES.iter() {
                let count = self.get_count(&Card::new(color, value));
                let total = get_count_for_value(value);
                write!(f, "{}/{} {}s", count, total, value)?;
                if value != FINAL_VALUE {
                    f.write_str(", ")?;
                }
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Discard {
    pub cards: Cards,
    counts: CardCounts,
}
impl Discard {
    pub fn new(variant: Variant) -> Discard {
        Discard {
            cards: Cards::new(),
            counts: CardCounts::new(variant),
        }
    }

    pub fn get_count(&self, card: &Card) -> u32 {
        self.counts.get_count(card)
    }

    pub fn has_all(&self, card: &Card) -> bool {
        self.counts.remaining(card) == 0
    }

    pub fn remaining(&self, card: &Card) -> u32 {
        self.counts.remaining(card)
    }

    pub fn counts(&self) -> &CardCounts {
        &self.counts
    }

    pub fn place(&mut self, card: Card) {
        self.counts.increment(&card);
        self.cards.push(card);
    }
}
impl fmt::Display for Discard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.counts)
    }
}

#[derive(Debug, Clone)]
pub struct Firework {
    pub color: Color,
    pub top: Value,
}
impl Firework {
    pub fn new(color: Color) -> Firework {
        Firework { color, top: 0 }
    }

    pub fn needed_value(&self) -> Option<Value> {
        if self.complete() {
            None
        } else {
            Some(self.top + 1)
        }
    }

    pub fn score(&self) -> Score {
        self.top
    }

    pub fn complete(&self) -> bool {
        self.top == FINAL_VALUE
    }

    pub fn place(&mut self, card: &Card) {
        assert!(
            card.color == self.color,
            "Attempted to place card on firework of wrong color!"
        );
        assert!(
            Some(card.value) == self.needed_value(),
            "Attempted to place card of wrong value on firework!"
        );
        self.top = card.value;
    }
}
impl fmt::Display for Firework {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.complete() {
            write!(f, "{} firework complete!", self.color)
        } else {
            write!(f, "{} firework at {}", self.color, self.top)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rainbow_cards_match_every_color_clue() {
        let wild = Card::new(RAINBOW, 3);
        for &color in Variant::Rainbow.clue_colors() {
            assert!(wild.matches(&Hinted::Color(color), Variant::Rainbow));
        }
        assert!(!wild.matches(&Hinted::Value(2), Variant::Rainbow));
        assert!(!Card::new('r', 3).matches(&Hinted::Color('y'), Variant::Rainbow));
    }

    #[test]
    fn purple_is_an_ordinary_suit() {
        let purple = Card::new(PURPLE, 1);
        assert!(purple.matches(&Hinted::Color(PURPLE), Variant::Purple));
        assert!(!purple.matches(&Hinted::Color('r'), Variant::Purple));
        assert!(Variant::Purple.clue_colors().contains(&PURPLE));
        assert!(!Variant::Rainbow.clue_colors().contains(&RAINBOW));
    }

    #[test]
    fn variant_sizes() {
        assert_eq!(Variant::NoVariant.total_cards(), 50);
        assert_eq!(Variant::Rainbow.total_cards(), 60);
        assert_eq!(Variant::NoVariant.perfect_score(), 25);
        assert_eq!(Variant::Purple.perfect_score(), 30);
        assert_eq!("rainbow".parse::<Variant>().ok(), Some(Variant::Rainbow));
        assert!("mauve".parse::<Variant>().is_err());
    }

    #[test]
    fn discard_tracks_remaining_copies() {
        let mut discard = Discard::new(Variant::NoVariant);
        let card = Card::new('g', 2);
        assert_eq!(discard.remaining(&card), 2);
        discard.place(card);
        assert!(!discard.has_all(&card));
        discard.place(card);
        assert!(discard.has_all(&card));
        assert_eq!(discard.cards.len(), 2);
    }
}
