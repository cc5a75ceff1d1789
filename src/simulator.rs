use fnv::FnvHashMap;
use rand::prelude::SliceRandom;
use rand::RngCore;
use rand::{self, SeedableRng};
use rand_chacha::ChaChaRng;
use std::fmt;
use std::fs::File;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::GameError;
use crate::game::*;
use crate::helpers::{PerPlayer, Tally};
use crate::json_output::*;
use crate::strategies::Lineup;
use crate::strategy::*;

pub fn new_deck(variant: Variant, seed: u64) -> Cards {
    let mut deck: Cards = Cards::new();

    for card in variant.all_cards() {
        for _ in 0..get_count_for_value(card.value) {
            deck.push(card);
        }
    }

    deck.shuffle(&mut ChaChaRng::seed_from_u64(seed));
    debug!("Deck: {:?}", deck);
    deck
}

/// A finished round.
pub struct GameOutcome<'game> {
    pub game: GameState<'game>,
    pub json: Option<serde_json::Value>,
    // fallbacks taken by every seat
    pub tally: Tally,
}
impl GameOutcome<'_> {
    pub fn score(&self) -> Score {
        self.game.final_score()
    }

    pub fn lives(&self) -> u32 {
        self.game.board.lives_remaining
    }
}

/// Plays `game` to the end with one strategy per seat.
///
/// Every player is told about every turn except the last one.
pub fn play_out<'game>(
    mut game: GameState<'game>,
    mut players: PerPlayer<Box<dyn PlayerStrategy>>,
    output_json: bool,
) -> Result<GameOutcome<'game>, GameError> {
    let variant = game.board.opts.variant;
    let mut actions = Vec::new();

    while !game.is_over() {
        let player = game.board.player;

        debug!("");
        debug!("=======================================================");
        debug!("Turn {}, Player {} to go", game.board.turn, player);
        debug!("=======================================================");
        debug!("{}", game);

        let choice = players[player].decide(&game.get_view(player))?;
        let card_id = match choice {
            TurnChoice::Play(index) | TurnChoice::Discard(index) => {
                game.hands[player].get(index).copied()
            }
            _ => None,
        };

        let record = game.process_choice(choice)?;

        if output_json {
            actions.push(match (choice, card_id) {
                (TurnChoice::Hint(ref hint), _) => action_clue(hint, variant),
                (TurnChoice::Play(_), Some(card_id)) => action_play(card_id),
                (TurnChoice::Discard(_), Some(card_id)) => action_discard(card_id),
                _ => action_terminate(player),
            });
        }

        if game.is_over() {
            break;
        }
        for player in game.get_players() {
            players[player].update(&record, &game.get_view(player))?;
        }
    }
    debug!("");
    debug!("=======================================================");
    debug!("Final state:\n{}", game);
    debug!("SCORE: {:?}", game.final_score());

    let mut tally = Tally::new();
    for (_, strategy) in players.iter() {
        tally.merge(&strategy.tally());
    }
    let json = if output_json {
        let player_names = game
            .get_players()
            .map(|player| players[player].name())
            .collect::<Vec<_>>();
        Some(json_format(variant, game.deck(), &actions, &player_names))
    } else {
        None
    };
    Ok(GameOutcome { game, json, tally })
}

pub fn simulate_once<'game>(
    opts: &'game GameOptions,
    lineup: &Lineup,
    seed: u64,
    output_json: bool,
) -> Result<GameOutcome<'game>, GameError> {
    lineup.check(opts)?;
    let game = GameState::new(opts, new_deck(opts.variant, seed));
    let players = PerPlayer::new(opts.num_players, |player| {
        lineup
            .seat(player)
            .initialize(opts)
            .initialize(player, &game.get_view(player))
    });
    let outcome = play_out(game, players, output_json)?;
    info!("Seed {}: score {}", seed, outcome.score());
    Ok(outcome)
}

#[derive(Debug)]
pub struct Histogram {
    pub hist: FnvHashMap<Score, u32>,
    pub sum: Score,
    pub total_count: u32,
}
impl Histogram {
    pub fn new() -> Histogram {
        Histogram {
            hist: FnvHashMap::default(),
            sum: 0,
            total_count: 0,
        }
    }
    fn insert_many(&mut self, val: Score, count: u32) {
        let new_count = self.get_count(&val) + count;
        self.hist.insert(val, new_count);
        self.sum += val * count;
        self.total_count += count;
    }
    pub fn insert(&mut self, val: Score) {
        self.insert_many(val, 1);
    }
    pub fn get_count(&self, val: &Score) -> u32 {
        *self.hist.get(val).unwrap_or(&0)
    }
    pub fn percentage_with(&self, val: &Score) -> f32 {
        self.get_count(val) as f32 / self.total_count as f32
    }
    pub fn average(&self) -> f32 {
        (self.sum as f32) / (self.total_count as f32)
    }
    pub fn stdev_of_average(&self) -> f32 {
        if self.total_count < 2 {
            return 0.0;
        }
        let average = self.average();
        let mut var_sum = 0.0;
        for (&val, &count) in self.hist.iter() {
            var_sum += (val as f32 - average).powi(2) * count as f32;
        }
        // Divide by (self.total_count - 1) estimate the variance of the distribution,
        // then divide by self.total_count estimate the variance of the sample average,
        // then take the sqrt to get the stdev.
        (var_sum / (((self.total_count - 1) * self.total_count) as f32)).sqrt()
    }
    pub fn merge(&mut self, other: Histogram) {
        for (val, count) in other.hist.into_iter() {
            self.insert_many(val, count);
        }
    }
}
impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}
impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut keys = self.hist.keys().collect::<Vec<_>>();
        keys.sort();
        for val in keys {
            write!(f, "\n{}: {}", val, self.get_count(val))?;
        }
        Ok(())
    }
}

fn write_replay(pattern: &str, seed: u64, json: &serde_json::Value) -> Result<(), GameError> {
    let path = PathBuf::from(pattern.replace("%s", &seed.to_string()));
    let file = File::create(&path).map_err(|source| GameError::Replay {
        path: path.clone(),
        source,
    })?;
    serde_json::to_writer(file, json).map_err(|source| GameError::ReplayFormat { path, source })
}

struct ThreadResult {
    non_perfect_seeds: Vec<u64>,
    scores: Histogram,
    lives: Histogram,
    tally: Tally,
}

#[allow(clippy::too_many_arguments)]
pub fn simulate(
    opts: &GameOptions,
    lineup: &Lineup,
    first_seed_opt: Option<u64>,
    n_trials: u32,
    n_threads: u32,
    progress_info: Option<u32>,
    json_output_pattern: Option<String>,
    json_losses_only: bool,
) -> Result<SimResult, GameError> {
    lineup.check(opts)?;
    let first_seed = first_seed_opt.unwrap_or_else(|| rand::thread_rng().next_u64());
    let perfect_score = opts.variant.perfect_score();
    let n_threads = n_threads.max(1);

    let json_output_pattern_ref = &json_output_pattern;
    crossbeam::scope(|scope| {
        let mut join_handles = Vec::new();
        for i in 0..n_threads {
            let start = first_seed + u64::from((n_trials * i) / n_threads);
            let end = first_seed + u64::from((n_trials * (i + 1)) / n_threads);
            join_handles.push(scope.spawn(move || -> Result<ThreadResult, GameError> {
                if progress_info.is_some() {
                    info!("Thread {} spawned: seeds {} to {}", i, start, end);
                }
                let mut result = ThreadResult {
                    non_perfect_seeds: Vec::new(),
                    scores: Histogram::new(),
                    lives: Histogram::new(),
                    tally: Tally::new(),
                };

                for seed in start..end {
                    if let Some(progress_info_frequency) = progress_info {
                        if (seed > start)
                            && ((seed - start) % u64::from(progress_info_frequency) == 0)
                        {
                            info!(
                                "Thread {}, Trials: {}, Stats so far: {} score, {} lives, {}% win",
                                i,
                                seed - start,
                                result.scores.average(),
                                result.lives.average(),
                                result.scores.percentage_with(&perfect_score) * 100.0
                            );
                        }
                    }
                    let outcome =
                        simulate_once(opts, lineup, seed, json_output_pattern_ref.is_some())?;
                    let score = outcome.score();
                    result.lives.insert(outcome.lives());
                    result.scores.insert(score);
                    result.tally.merge(&outcome.tally);
                    if score != perfect_score {
                        result.non_perfect_seeds.push(seed);
                    }
                    if let (Some(pattern), Some(json)) = (json_output_pattern_ref, &outcome.json) {
                        if !(score == perfect_score && json_losses_only) {
                            write_replay(pattern, seed, json)?;
                        }
                    }
                }
                if progress_info.is_some() {
                    info!("Thread {} done", i);
                }
                Ok(result)
            }));
        }

        let mut non_perfect_seeds: Vec<u64> = Vec::new();
        let mut score_histogram = Histogram::new();
        let mut lives_histogram = Histogram::new();
        let mut tally = Tally::new();
        for join_handle in join_handles {
            let thread = join_handle.join()?;
            non_perfect_seeds.extend(thread.non_perfect_seeds.iter());
            score_histogram.merge(thread.scores);
            lives_histogram.merge(thread.lives);
            tally.merge(&thread.tally);
        }

        non_perfect_seeds.sort_unstable();
        Ok(SimResult {
            scores: score_histogram,
            lives: lives_histogram,
            perfect_score,
            non_perfect_seed: non_perfect_seeds.first().cloned(),
            tally,
        })
    })
}

pub struct SimResult {
    pub scores: Histogram,
    pub lives: Histogram,
    pub perfect_score: Score,
    pub non_perfect_seed: Option<u64>,
    pub tally: Tally,
}

impl SimResult {
    pub fn percent_perfect(&self) -> f32 {
        self.scores.percentage_with(&self.perfect_score) * 100.0
    }

    pub fn percent_perfect_stderr(&self) -> f32 {
        if self.scores.total_count < 2 {
            return 0.0;
        }
        let pp = self.percent_perfect() / 100.0;
        let stdev = (pp * (1.0 - pp) / ((self.scores.total_count - 1) as f32)).sqrt();
        stdev * 100.0
    }

    pub fn average_score(&self) -> f32 {
        self.scores.average()
    }

    pub fn score_stderr(&self) -> f32 {
        self.scores.stdev_of_average()
    }

    pub fn average_lives(&self) -> f32 {
        self.lives.average()
    }

    pub fn info(&self) {
        info!("Score histogram:\n{}", self.scores);

        if let Some(seed) = self.non_perfect_seed {
            info!("Example seed with non-perfect score: {}", seed);
        }

        info!("Percentage perfect: {:?}%", self.percent_perfect());
        info!("Average score: {:?}", self.average_score());
        info!("Average lives: {:?}", self.average_lives());
        if !self.tally.is_empty() {
            info!("Fallbacks taken:\n{}", self.tally);
        }
    }
}
