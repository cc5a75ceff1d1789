use hat_hanabi::game::*;
use hat_hanabi::helpers::PerPlayer;
use hat_hanabi::simulator::{new_deck, play_out, simulate, simulate_once};
use hat_hanabi::strategies::{Lineup, StrategyRegistry};
use hat_hanabi::strategy::PlayerStrategy;
use hat_hanabi::GameError;

fn seat_players(game: &GameState<'_>, lineup: &Lineup) -> PerPlayer<Box<dyn PlayerStrategy>> {
    let opts = game.board.opts;
    PerPlayer::new(opts.num_players, |player| {
        lineup
            .seat(player)
            .initialize(opts)
            .initialize(player, &game.get_view(player))
    })
}

fn cards_in_play(game: &GameState<'_>) -> u32 {
    let board = &game.board;
    let in_hands: usize = game.get_players().map(|p| game.hands[p].len()).sum();
    let on_fireworks: u32 = board.fireworks.values().map(|f| f.score()).sum();
    board.deck_size + in_hands as u32 + board.discard.cards.len() as u32 + on_fireworks
}

#[test]
fn two_basic_players_finish_a_round() {
    let registry = StrategyRegistry::standard();
    let opts = GameOptions::new(2, Variant::NoVariant);
    let lineup = Lineup::uniform(&registry, "basic", 2).unwrap();
    let outcome = simulate_once(&opts, &lineup, 0, false).unwrap();
    let board = &outcome.game.board;
    assert!(outcome.game.is_over());
    assert!(outcome.score() <= Variant::NoVariant.perfect_score());
    assert_eq!(board.turn_history.len() as u32, board.turn - 1);
    for (index, record) in board.turn_history.iter().enumerate() {
        assert_eq!(record.turn, index as u32 + 1);
        assert_eq!(record.player, index as u32 % 2);
    }
}

#[test]
fn hat_players_beat_the_idiot_baseline() {
    let registry = StrategyRegistry::standard();
    let opts = GameOptions::new(4, Variant::NoVariant);

    let hat = Lineup::uniform(&registry, "hat", 4).unwrap();
    let hat = simulate(&opts, &hat, Some(42), 100, 4, None, None, false).unwrap();
    let idiot = Lineup::uniform(&registry, "idiot", 4).unwrap();
    let idiot = simulate(&opts, &idiot, Some(42), 100, 4, None, None, false).unwrap();

    assert_eq!(hat.scores.total_count, 100);
    assert!(
        hat.average_score() > 20.0,
        "hat averaged {}",
        hat.average_score()
    );
    assert!(
        hat.average_score() > idiot.average_score() + 3.0,
        "hat averaged {}, idiot {}",
        hat.average_score(),
        idiot.average_score()
    );
}

#[test]
fn hat_players_follow_every_decoded_action() {
    let registry = StrategyRegistry::standard();
    for n in [4, 5] {
        let opts = GameOptions::new(n, Variant::NoVariant);
        let lineup = Lineup::uniform(&registry, "hat", n).unwrap();
        for seed in 0..50 {
            let outcome = simulate_once(&opts, &lineup, seed, false).unwrap();
            for label in [
                "someone performed the wrong action",
                "player did not play",
                "player played wrong card",
                "I misplayed",
            ] {
                assert_eq!(
                    outcome.tally.get(label),
                    0,
                    "{} players, seed {}: {}",
                    n,
                    seed,
                    label
                );
            }
            assert_eq!(outcome.lives(), opts.num_lives, "{} players, seed {}", n, seed);
        }
    }
}

#[test]
fn hat_players_handle_five_seats() {
    let registry = StrategyRegistry::standard();
    let opts = GameOptions::new(5, Variant::NoVariant);
    let lineup = Lineup::uniform(&registry, "hat", 5).unwrap();
    let result = simulate(&opts, &lineup, Some(7), 20, 2, None, None, false).unwrap();
    assert_eq!(result.scores.total_count, 20);
    assert!(result.average_score() > 15.0);
}

#[test]
fn basic_players_clue_both_attributes() {
    let registry = StrategyRegistry::standard();
    let opts = GameOptions::new(4, Variant::NoVariant);
    let lineup = Lineup::uniform(&registry, "basic", 4).unwrap();
    let mut total = 0;
    let mut color_clues = 0;
    for seed in 0..30 {
        let outcome = simulate_once(&opts, &lineup, seed, false).unwrap();
        total += outcome.score();
        color_clues += outcome
            .game
            .board
            .turn_history
            .iter()
            .filter(|record| {
                matches!(
                    record.choice,
                    TurnChoice::Hint(Hint {
                        hinted: Hinted::Color(_),
                        ..
                    })
                )
            })
            .count();
        // only proven cards are played
        assert_eq!(outcome.lives(), opts.num_lives);
    }
    assert!(color_clues > 0);
    let average = total as f64 / 30.0;
    assert!(average > 5.0, "basic averaged {}", average);
}

#[test]
fn brainbow_plays_rainbow_tables() {
    let registry = StrategyRegistry::standard();
    let opts = GameOptions::new(3, Variant::Rainbow);
    assert!(Lineup::uniform(&registry, "basic", 3)
        .unwrap()
        .check(&opts)
        .is_err());
    let lineup = Lineup::uniform(&registry, "brainbow", 3).unwrap();
    let result = simulate(&opts, &lineup, Some(5), 20, 2, None, None, false).unwrap();
    assert_eq!(result.scores.total_count, 20);
    assert!(result.average_score() > 3.0, "brainbow averaged {}", result.average_score());
    assert_eq!(result.average_lives(), opts.num_lives as f32);
}

#[test]
fn encoders_decode_every_clue() {
    let registry = StrategyRegistry::standard();
    for n in 2..=5 {
        let opts = GameOptions::new(n, Variant::NoVariant);
        let lineup = Lineup::uniform(&registry, "gencoder", n).unwrap();
        // a misread clue surfaces as an error from the reader
        let result = simulate(&opts, &lineup, Some(20), 10, 2, None, None, false).unwrap();
        assert_eq!(result.scores.total_count, 10);
        assert!(
            result.average_score() > 8.0,
            "gencoder with {} players averaged {}",
            n,
            result.average_score()
        );
        assert!(result.average_lives() >= 1.0);
    }
    let opts = GameOptions::new(3, Variant::Purple);
    let lineup = Lineup::uniform(&registry, "gencoder", 3).unwrap();
    let err = simulate(&opts, &lineup, Some(0), 1, 1, None, None, false)
        .err()
        .unwrap();
    assert!(err.is_configuration());
}

#[test]
fn no_clue_tokens_force_one_unsafe_discard() {
    let registry = StrategyRegistry::standard();
    let opts = GameOptions::new(4, Variant::NoVariant);
    let lineup = Lineup::uniform(&registry, "hat", 4).unwrap();
    lineup.check(&opts).unwrap();

    let mut game = GameState::new(&opts, new_deck(opts.variant, 3));
    game.board.hints_remaining = 0;
    let mut players = seat_players(&game, &lineup);

    let choice = players[0].decide(&game.get_view(0)).unwrap();
    assert_eq!(choice, TurnChoice::Discard(3));
    assert_eq!(players[0].tally().get("unsafe discard at 0 clues"), 1);
    assert_eq!(players[0].tally().get("safe discard at 0 clues"), 0);

    let record = game.process_choice(choice).unwrap();
    assert_eq!(game.board.hints_remaining, 1);
    for player in game.get_players() {
        players[player]
            .update(&record, &game.get_view(player))
            .unwrap();
    }

    let outcome = play_out(game, players, false).unwrap();
    assert!(outcome.game.is_over());
    assert!(outcome.tally.get("unsafe discard at 0 clues") >= 1);
}

#[test]
fn cards_are_conserved_and_tokens_stay_in_bounds() {
    let registry = StrategyRegistry::standard();
    for (n, variant, name) in [
        (3, Variant::NoVariant, "cheater"),
        (2, Variant::Purple, "heuristic"),
        (5, Variant::Rainbow, "idiot"),
        (4, Variant::NoVariant, "hat"),
        (3, Variant::NoVariant, "gencoder"),
    ] {
        let opts = GameOptions::new(n, variant);
        let lineup = Lineup::uniform(&registry, name, n).unwrap();
        let mut game = GameState::new(&opts, new_deck(variant, 11));
        let mut players = seat_players(&game, &lineup);
        let total = variant.total_cards();
        let mut last_score = 0;

        while !game.is_over() {
            let player = game.board.player;
            let choice = players[player].decide(&game.get_view(player)).unwrap();
            let record = game.process_choice(choice).unwrap();

            assert_eq!(cards_in_play(&game), total);
            assert!(game.board.hints_remaining <= opts.num_hints);
            assert!(game.board.lives_remaining <= opts.num_lives);
            assert!(game.score() >= last_score);
            last_score = game.score();

            if game.is_over() {
                break;
            }
            for player in game.get_players() {
                players[player]
                    .update(&record, &game.get_view(player))
                    .unwrap();
            }
        }
        assert!(game.board.turn <= 2 * total);
    }
}

#[test]
fn policing_stops_peeking_strategies() {
    let registry = StrategyRegistry::standard();
    let mut opts = GameOptions::new(3, Variant::NoVariant);
    opts.policing = true;
    let lineup = Lineup::uniform(&registry, "cheater", 3).unwrap();
    match simulate_once(&opts, &lineup, 1, false) {
        Err(GameError::OwnHandPeek { player }) => assert_eq!(player, 0),
        other => panic!("expected a peek violation, got {:?}", other.err()),
    }

    let lineup = Lineup::uniform(&registry, "heuristic", 3).unwrap();
    assert!(simulate_once(&opts, &lineup, 1, false).is_ok());
}

#[test]
fn misplays_cost_exactly_one_life() {
    let opts = GameOptions::new(2, Variant::NoVariant);
    let deck = new_deck(Variant::NoVariant, 5);
    let mut game = GameState::new(&opts, deck);
    let slot = game.hands[0]
        .iter()
        .position(|&id| !game.board.is_playable(&game.card(id)));
    let slot = match slot {
        Some(slot) => slot,
        None => return,
    };
    let card = game.card(game.hands[0][slot]);
    game.process_choice(TurnChoice::Play(slot)).unwrap();
    assert_eq!(game.board.mistakes(), 1);
    assert_eq!(game.board.progress(card.color), 0);
    assert_eq!(game.hands[0].len(), 5);
    assert_eq!(game.board.discard.cards, vec![card]);
}

#[test]
fn replays_are_written_for_losses_only() {
    let registry = StrategyRegistry::standard();
    let opts = GameOptions::new(2, Variant::NoVariant);
    let lineup = Lineup::uniform(&registry, "basic", 2).unwrap();
    let dir = std::env::temp_dir().join(format!("hat_hanabi_replays_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let pattern = dir.join("round_%s.json").to_string_lossy().into_owned();

    let result = simulate(&opts, &lineup, Some(0), 3, 1, None, Some(pattern), true).unwrap();
    // two basic players never reach 25 on these seeds
    let first = result.non_perfect_seed.unwrap();
    let text = std::fs::read_to_string(dir.join(format!("round_{}.json", first))).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["players"].as_array().unwrap().len(), 2);
    assert_eq!(json["first_player"], 0);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn unwritable_replays_are_errors() {
    let registry = StrategyRegistry::standard();
    let opts = GameOptions::new(2, Variant::NoVariant);
    let lineup = Lineup::uniform(&registry, "basic", 2).unwrap();
    let pattern = "/nonexistent-dir/replay_%s.json".to_string();
    let err = simulate(&opts, &lineup, Some(0), 1, 1, None, Some(pattern), false)
        .err()
        .unwrap();
    assert!(matches!(err, GameError::Replay { .. }));
    assert!(!err.is_configuration());
}
