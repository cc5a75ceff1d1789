use crate::error::GameError;
use crate::game::*;
use crate::hints::CardKnowledge;
use crate::strategy::*;

pub const NAME: &str = "basic";
pub const RAINBOW_NAME: &str = "brainbow";

// Plays a card only when its clues prove it playable. Otherwise clues a
// playable card it sees, one attribute the holder has not been told yet,
// or discards.
//
// `basic` treats every suit as ordinary and refuses rainbow tables.
// `brainbow` reads rainbow as wild, starts looking at the next player,
// and keeps cards whose identity it has worked out.
pub struct BasicConfig {
    wild_rainbow: bool,
}

impl BasicConfig {
    pub fn basic() -> BasicConfig {
        BasicConfig {
            wild_rainbow: false,
        }
    }

    pub fn rainbow() -> BasicConfig {
        BasicConfig { wild_rainbow: true }
    }
}

impl GameStrategyConfig for BasicConfig {
    fn name(&self) -> &'static str {
        if self.wild_rainbow {
            RAINBOW_NAME
        } else {
            NAME
        }
    }

    fn check_table(&self, opts: &GameOptions, _: &[&'static str]) -> Result<(), GameError> {
        if !self.wild_rainbow && opts.variant == Variant::Rainbow {
            return Err(GameError::UnsupportedVariant {
                strategy: NAME,
                variant: opts.variant,
            });
        }
        Ok(())
    }

    fn initialize(&self, _: &GameOptions) -> Box<dyn GameStrategy> {
        Box::new(BasicStrategy {
            wild_rainbow: self.wild_rainbow,
        })
    }
}

pub struct BasicStrategy {
    wild_rainbow: bool,
}

impl GameStrategy for BasicStrategy {
    fn initialize(&self, player: Player, _: &PlayerView<'_>) -> Box<dyn PlayerStrategy> {
        Box::new(BasicPlayer {
            me: player,
            wild_rainbow: self.wild_rainbow,
        })
    }
}

pub struct BasicPlayer {
    me: Player,
    wild_rainbow: bool,
}

fn proven_playable(knowledge: &CardKnowledge, board: &BoardState<'_>) -> bool {
    let possible = knowledge.possible_cards(board.opts.variant, &board.public_counts());
    !possible.is_empty() && possible.iter().all(|card| board.is_playable(card))
}

impl BasicPlayer {
    fn surely_playable(&self, view: &PlayerView<'_>) -> Option<usize> {
        view.hand_knowledge(self.me)
            .iter()
            .position(|knowledge| proven_playable(knowledge, view.board))
    }

    // `basic` looks around the table from seat 0, `brainbow` from the next seat
    fn targets(&self, view: &PlayerView<'_>) -> Vec<Player> {
        if self.wild_rainbow {
            let n = view.board.opts.num_players;
            (1..n).map(|offset| (self.me + offset) % n).collect()
        } else {
            view.other_players().collect()
        }
    }

    /// The attribute of `card` its holder still lacks: the rank first, then
    /// a color that tells it apart from the other suits.
    fn missing_token(
        &self,
        view: &PlayerView<'_>,
        target: Player,
        card: &Card,
        knowledge: &CardKnowledge,
    ) -> Option<Hinted> {
        let opts = view.board.opts;
        let variant = opts.variant;
        let has_value = knowledge
            .direct()
            .iter()
            .any(|hinted| matches!(hinted, Hinted::Value(_)));
        if !has_value {
            return Some(Hinted::Value(card.value));
        }
        let told = |color: Color| {
            knowledge.direct().contains(&Hinted::Color(color))
                || knowledge.indirect().contains(&Hinted::Color(color))
        };
        if variant.clue_colors().contains(&card.color) && !told(card.color) {
            return Some(Hinted::Color(card.color));
        }
        // a second color separates a rainbow card from an ordinary one
        let hand = view.hand(target);
        variant
            .clue_colors()
            .iter()
            .copied()
            .filter(|&color| !told(color))
            .map(Hinted::Color)
            .find(|hinted| {
                opts.allow_empty_hints || hand.iter().any(|other| other.matches(hinted, variant))
            })
    }

    fn find_clue(&self, view: &PlayerView<'_>) -> Option<Hint> {
        let board = view.board;
        for target in self.targets(view) {
            let hand = view.hand(target);
            let knowledge = view.hand_knowledge(target);
            for (card, knowledge) in hand.iter().zip(knowledge) {
                if !board.is_playable(card) || proven_playable(knowledge, board) {
                    continue;
                }
                if let Some(hinted) = self.missing_token(view, target, card, knowledge) {
                    return Some(Hint {
                        player: target,
                        hinted,
                    });
                }
            }
        }
        None
    }

    fn discard_slot(&self, view: &PlayerView<'_>) -> usize {
        if !self.wild_rainbow {
            return 0;
        }
        view.hand_knowledge(self.me)
            .iter()
            .position(|knowledge| !knowledge.is_known())
            .unwrap_or(0)
    }
}

impl PlayerStrategy for BasicPlayer {
    fn name(&self) -> String {
        if self.wild_rainbow {
            RAINBOW_NAME.to_string()
        } else {
            NAME.to_string()
        }
    }

    fn decide(&mut self, view: &PlayerView<'_>) -> Result<TurnChoice, GameError> {
        if let Some(index) = self.surely_playable(view) {
            return Ok(TurnChoice::Play(index));
        }
        if view.board.hints_remaining > 0 {
            if let Some(hint) = self.find_clue(view) {
                return Ok(TurnChoice::Hint(hint));
            }
        }
        Ok(TurnChoice::Discard(self.discard_slot(view)))
    }

    fn update(&mut self, _: &TurnRecord, _: &PlayerView<'_>) -> Result<(), GameError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::new_deck;

    fn deck_starting_with(variant: Variant, first: &[Card]) -> Cards {
        let mut rest = variant
            .all_cards()
            .flat_map(|card| (0..get_count_for_value(card.value)).map(move |_| card))
            .collect::<Vec<_>>();
        for card in first {
            let index = rest.iter().position(|c| c == card).unwrap();
            rest.remove(index);
        }
        first.iter().copied().chain(rest).collect()
    }

    fn player(me: Player, wild_rainbow: bool) -> BasicPlayer {
        BasicPlayer { me, wild_rainbow }
    }

    #[test]
    fn clued_ones_get_played() {
        let opts = GameOptions::new(2, Variant::NoVariant);
        let mut game = GameState::new(&opts, new_deck(Variant::NoVariant, 11));
        let mut basic = player(1, false);
        let hand = game.get_view(0).hand(1);
        let one = match hand.iter().position(|card| card.value == 1) {
            Some(index) => index,
            None => return,
        };
        let color = hand[one].color;
        game.process_choice(TurnChoice::Hint(Hint {
            player: 1,
            hinted: Hinted::Value(1),
        }))
        .unwrap();
        let choice = basic.decide(&game.get_view(1)).unwrap();
        match choice {
            TurnChoice::Play(index) => assert_eq!(game.card(game.hands[1][index]).value, 1),
            other => panic!("expected a play of {}1, got {:?}", color, other),
        }
    }

    #[test]
    fn a_ranked_card_gets_its_color_next() {
        let opts = GameOptions::new(2, Variant::NoVariant);
        let deck = deck_starting_with(
            Variant::NoVariant,
            &[
                Card::new('y', 3),
                Card::new('g', 3),
                Card::new('b', 3),
                Card::new('w', 3),
                Card::new('r', 3),
                Card::new('b', 4),
                Card::new('g', 1),
                Card::new('y', 4),
                Card::new('r', 4),
                Card::new('w', 4),
            ],
        );
        let mut game = GameState::new(&opts, deck);
        let mut first = player(0, false);
        let mut second = player(1, false);

        let clue = first.decide(&game.get_view(0)).unwrap();
        assert_eq!(
            clue,
            TurnChoice::Hint(Hint {
                player: 1,
                hinted: Hinted::Value(1),
            })
        );
        game.process_choice(clue).unwrap();
        // every 1 is playable, so a lone rank clue proves g1
        assert_eq!(second.decide(&game.get_view(1)).unwrap(), TurnChoice::Play(1));
        game.process_choice(TurnChoice::Play(1)).unwrap();

        // with g1 down, a clued 1 could be the dead g1
        let id = game.hands[1][4];
        assert_eq!(game.card(id), Card::new('r', 1));
        game.process_choice(TurnChoice::Hint(Hint {
            player: 1,
            hinted: Hinted::Value(1),
        }))
        .unwrap();
        game.process_choice(TurnChoice::Discard(0)).unwrap();
        assert!(!proven_playable(game.knowledge(id), &game.board));
        assert_eq!(
            first.decide(&game.get_view(0)).unwrap(),
            TurnChoice::Hint(Hint {
                player: 1,
                hinted: Hinted::Color('r'),
            })
        );
    }

    #[test]
    fn rainbow_cards_get_a_second_color() {
        let opts = GameOptions::new(2, Variant::Rainbow);
        let deck = deck_starting_with(
            Variant::Rainbow,
            &[
                Card::new('r', 1),
                Card::new('y', 3),
                Card::new('g', 3),
                Card::new('b', 3),
                Card::new('w', 3),
                Card::new(RAINBOW, 1),
                Card::new('r', 4),
                Card::new('y', 4),
                Card::new('g', 4),
                Card::new('b', 4),
            ],
        );
        let mut game = GameState::new(&opts, deck);
        let mut brainbow = player(0, true);
        game.process_choice(TurnChoice::Play(0)).unwrap();
        game.process_choice(TurnChoice::Discard(4)).unwrap();
        game.process_choice(TurnChoice::Hint(Hint {
            player: 1,
            hinted: Hinted::Color('r'),
        }))
        .unwrap();
        game.process_choice(TurnChoice::Discard(3)).unwrap();
        game.process_choice(TurnChoice::Hint(Hint {
            player: 1,
            hinted: Hinted::Value(1),
        }))
        .unwrap();
        game.process_choice(TurnChoice::Discard(2)).unwrap();

        // red or rainbow 1, and r1 is already down
        let id = game.hands[1][0];
        assert_eq!(game.card(id), Card::new(RAINBOW, 1));
        assert!(!proven_playable(game.knowledge(id), &game.board));
        assert_eq!(
            brainbow.decide(&game.get_view(0)).unwrap(),
            TurnChoice::Hint(Hint {
                player: 1,
                hinted: Hinted::Color('y'),
            })
        );
    }

    #[test]
    fn brainbow_keeps_known_cards() {
        let opts = GameOptions::new(2, Variant::Rainbow);
        let game = GameState::new(&opts, new_deck(Variant::Rainbow, 2));
        let brainbow = player(1, true);
        assert_eq!(brainbow.discard_slot(&game.get_view(1)), 0);
        assert_eq!(player(1, false).discard_slot(&game.get_view(1)), 0);
    }
}
