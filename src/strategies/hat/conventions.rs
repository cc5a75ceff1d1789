use fnv::FnvHashMap;

use crate::game::*;
use crate::helpers::highest_value_index;
use crate::strategies::hat_helpers::{is_between_inclusive, HatAction};

/// Firework heights assuming every clued play so far has landed.
pub type Progress = FnvHashMap<Color, Value>;

pub fn progress_of(progress: &Progress, color: Color) -> Value {
    *progress.get(&color).unwrap_or(&0)
}

pub fn board_progress(board: &BoardState<'_>) -> Progress {
    board
        .opts
        .variant
        .colors()
        .iter()
        .map(|&color| (color, board.progress(color)))
        .collect()
}

pub fn is_playable_on(card: &Card, progress: &Progress) -> bool {
    progress_of(progress, card.color) + 1 == card.value
}

pub fn is_played_on(card: &Card, progress: &Progress) -> bool {
    card.value <= progress_of(progress, card.color)
}

/// Last unplayed copy, judged against the discard pile at clue time.
pub fn is_critical_at(card: &Card, progress: &Progress, discard: &Discard) -> bool {
    card.value > progress_of(progress, card.color)
        && discard.get_count(card) + 1 == get_count_for_value(card.value)
}

/// Newest card that also appears earlier in the hand.
fn duplicate_index(cards: &[Card]) -> Option<usize> {
    (1..cards.len())
        .rev()
        .find(|&index| cards[..index].contains(&cards[index]))
}

/// Discard part of a standard action: a card already played, else a
/// duplicate within the hand, else give a clue.
pub fn safe_discard(cards: &[Card], progress: &Progress) -> HatAction {
    if let Some(index) = cards.iter().position(|card| is_played_on(card, progress)) {
        return HatAction::Discard(index);
    }
    if let Some(index) = duplicate_index(cards) {
        return HatAction::Discard(index);
    }
    HatAction::Hint
}

/// Whether `player` should play `card` under the clue being interpreted.
///
/// `claimed` maps cards already assigned to earlier clues to the player
/// who will play them.
pub fn want_to_play(
    cluer: Player,
    player: Player,
    dont_play: &[Card],
    progress: &Progress,
    claimed: &FnvHashMap<Card, Player>,
    card: &Card,
    board: &BoardState<'_>,
) -> bool {
    if !is_playable_on(card, progress) {
        return false;
    }
    if dont_play.contains(card) {
        return false;
    }
    if board.is_playable(card) {
        return true;
    }
    // the card below must be played by someone acting before `player`
    let below = Card::new(card.color, card.value - 1);
    match claimed.get(&below) {
        Some(&holder) => is_between_inclusive(holder, cluer, player, board.opts.num_players),
        None => false,
    }
}

/// Among the wanted plays, the newest of the lowest rank, preferring
/// critical cards.
pub fn choose_play(
    cards: &[Card],
    mut wanted: Vec<usize>,
    progress: &Progress,
    discard: &Discard,
) -> Option<usize> {
    wanted.reverse();
    let lowest = wanted.iter().map(|&index| cards[index].value).min()?;
    wanted.retain(|&index| cards[index].value == lowest);
    if wanted
        .iter()
        .any(|&index| is_critical_at(&cards[index], progress, discard))
    {
        wanted.retain(|&index| is_critical_at(&cards[index], progress, discard));
    }
    wanted.first().copied()
}

/// Highest card that is not a five, not playable, and has no copy in the
/// discard pile yet.
pub fn least_bad_discard(
    action: HatAction,
    cards: &[Card],
    progress: &Progress,
    discard: &Discard,
) -> HatAction {
    if action.is_discard() {
        return action;
    }
    let candidates = (0..cards.len())
        .filter(|&index| {
            let card = &cards[index];
            discard.get_count(card) == 0
                && card.value != FINAL_VALUE
                && !is_playable_on(card, progress)
        })
        .collect::<Vec<_>>();
    match highest_value_index(cards, candidates) {
        Some(index) => HatAction::Discard(index),
        None => HatAction::Hint,
    }
}

/// What the cluer knows about the table when choosing the modified action.
#[derive(Debug, Clone)]
pub struct ModifiedContext {
    pub futureplays: usize,
    pub endgame: bool,
    // hints available on the modified player's turn
    pub modified_hints: i32,
    pub min_futurehints: i32,
    pub futurehints: i32,
    pub modified_progress: Progress,
    pub modified_dic: FnvHashMap<Card, Player>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Progress {
        Variant::NoVariant
            .colors()
            .iter()
            .map(|&color| (color, 0))
            .collect()
    }

    #[test]
    fn safe_discard_prefers_played_then_duplicates() {
        let mut progress = fresh();
        let cards = [
            Card::new('r', 3),
            Card::new('g', 2),
            Card::new('r', 3),
            Card::new('g', 2),
        ];
        assert_eq!(safe_discard(&cards, &progress), HatAction::Discard(3));
        progress.insert('r', 3);
        assert_eq!(safe_discard(&cards, &progress), HatAction::Discard(0));
        let distinct = [Card::new('b', 1), Card::new('w', 4)];
        assert_eq!(safe_discard(&distinct, &fresh()), HatAction::Hint);
    }

    #[test]
    fn plays_prefer_low_ranks_then_the_newest() {
        let cards = [
            Card::new('r', 1),
            Card::new('y', 2),
            Card::new('g', 1),
            Card::new('b', 4),
        ];
        let discard = Discard::new(Variant::NoVariant);
        assert_eq!(choose_play(&cards, vec![0, 2], &fresh(), &discard), Some(2));
        assert_eq!(choose_play(&cards, vec![], &fresh(), &discard), None);
    }

    #[test]
    fn critical_plays_come_first() {
        let cards = [Card::new('r', 1), Card::new('g', 1)];
        let mut discard = Discard::new(Variant::NoVariant);
        discard.place(Card::new('r', 1));
        discard.place(Card::new('r', 1));
        assert_eq!(choose_play(&cards, vec![0, 1], &fresh(), &discard), Some(0));
    }

    #[test]
    fn least_bad_discard_skips_fives_and_discarded_names() {
        let cards = [
            Card::new('r', 5),
            Card::new('y', 3),
            Card::new('g', 4),
            Card::new('b', 1),
        ];
        let mut discard = Discard::new(Variant::NoVariant);
        assert_eq!(
            least_bad_discard(HatAction::Hint, &cards, &fresh(), &discard),
            HatAction::Discard(2)
        );
        discard.place(Card::new('g', 4));
        assert_eq!(
            least_bad_discard(HatAction::Hint, &cards, &fresh(), &discard),
            HatAction::Discard(1)
        );
        assert_eq!(
            least_bad_discard(HatAction::Discard(3), &cards, &fresh(), &discard),
            HatAction::Discard(3)
        );
    }
}
