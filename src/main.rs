use getopts::Options;
use std::process;
use std::str::FromStr;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use hat_hanabi::game::{GameOptions, ScoringPolicy, Variant};
use hat_hanabi::simulator;
use hat_hanabi::strategies::{Lineup, StrategyRegistry};
use hat_hanabi::GameError;

fn print_usage(program: &str, opts: Options, registry: &StrategyRegistry) {
    print!("{}", opts.usage(&format!("Usage: {} [options]", program)));
    println!("\nStrategies: {}", registry.names().join(", "));
}

fn parse_number<T: FromStr>(matches: &getopts::Matches, name: &str, default: T) -> Result<T, GameError> {
    match matches.opt_str(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| GameError::BadOption(format!("--{} expects a number, got {:?}", name, raw))),
    }
}

fn init_logging(verbosity: &str) -> Result<(), GameError> {
    let level = match verbosity {
        "silent" => "warn",
        "scores" => "info",
        "verbose" => "debug",
        "log" => "trace",
        other => {
            return Err(GameError::BadOption(format!(
                "unknown verbosity {:?}, expected silent, scores, verbose or log",
                other
            )))
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let program = args[0].clone();
    let registry = StrategyRegistry::standard();

    let mut opts = Options::new();
    opts.optopt("g", "strategy", "Strategy for every seat (default hat)", "NAME");
    opts.optopt("", "players", "Comma separated strategy per seat, in turn order", "A,B,..");
    opts.optopt("p", "nplayers", "Number of players (default 4)", "NPLAYERS");
    opts.optopt("v", "variant", "vanilla, purple or rainbow (default vanilla)", "VARIANT");
    opts.optopt("n", "ntrials", "Number of rounds to simulate (default 1)", "NTRIALS");
    opts.optopt("s", "seed", "Seed of the first round (default random)", "SEED");
    opts.optopt("t", "nthreads", "Number of threads (default 1)", "NTHREADS");
    opts.optopt("o", "output", "Report progress every N rounds per thread", "N");
    opts.optopt("", "verbosity", "silent, scores, verbose or log (default scores)", "LEVEL");
    opts.optflag("", "police", "Fail strategies that read their own cards");
    opts.optflag("", "partial-score", "Keep the fireworks score when the last life is lost");
    opts.optopt("j", "json-output", "Write a replay per round; %s becomes the seed", "PATTERN");
    opts.optflag("", "losses-only", "With --json-output, only write rounds that were not perfect");
    opts.optflag("h", "help", "Print this help");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(err) => {
            eprintln!("{}", err);
            print_usage(&program, opts, &registry);
            process::exit(2);
        }
    };
    if matches.opt_present("h") {
        print_usage(&program, opts, &registry);
        return;
    }
    if !matches.free.is_empty() {
        eprintln!("unexpected arguments: {}", matches.free.join(" "));
        print_usage(&program, opts, &registry);
        process::exit(2);
    }

    let verbosity = matches
        .opt_str("verbosity")
        .unwrap_or_else(|| "scores".to_string());
    if let Err(err) = init_logging(&verbosity) {
        eprintln!("{}", err);
        process::exit(2);
    }

    match run(&matches, &registry) {
        Ok(()) => {}
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(if err.is_configuration() { 2 } else { 1 });
        }
    }
}

fn run(matches: &getopts::Matches, registry: &StrategyRegistry) -> Result<(), GameError> {
    let variant = match matches.opt_str("variant") {
        Some(name) => name.parse::<Variant>()?,
        None => Variant::NoVariant,
    };

    let seats: Option<Vec<String>> = matches
        .opt_str("players")
        .map(|list| list.split(',').map(|name| name.trim().to_string()).collect());
    let default_players = seats.as_ref().map_or(4, |seats| seats.len() as u32);
    let n_players = parse_number(matches, "nplayers", default_players)?;
    if !(2..=6).contains(&n_players) {
        return Err(GameError::BadOption(format!(
            "a table seats 2 to 6 players, not {}",
            n_players
        )));
    }

    let lineup = match (seats, matches.opt_str("strategy")) {
        (Some(_), Some(_)) => {
            return Err(GameError::BadOption(
                "--strategy and --players cannot be combined".to_string(),
            ))
        }
        (Some(seats), None) => Lineup::new(registry, &seats[..])?,
        (None, strategy) => {
            let name = strategy.unwrap_or_else(|| "hat".to_string());
            Lineup::uniform(registry, &name, n_players)?
        }
    };

    let mut game_opts = GameOptions::new(n_players, variant);
    game_opts.policing = matches.opt_present("police");
    if matches.opt_present("partial-score") {
        game_opts.scoring = ScoringPolicy::KeepPartial;
    }

    let n_trials = parse_number(matches, "ntrials", 1u32)?;
    let n_threads = parse_number(matches, "nthreads", 1u32)?;
    let seed = match matches.opt_str("seed") {
        Some(_) => Some(parse_number(matches, "seed", 0u64)?),
        None => None,
    };
    let progress_info = match matches.opt_str("output") {
        Some(_) => Some(parse_number(matches, "output", 1u32)?.max(1)),
        None => None,
    };
    let json_output = matches.opt_str("json-output");
    let losses_only = matches.opt_present("losses-only");
    if losses_only && json_output.is_none() {
        warn!("--losses-only has no effect without --json-output");
    }

    let results = simulator::simulate(
        &game_opts,
        &lineup,
        seed,
        n_trials,
        n_threads,
        progress_info,
        json_output,
        losses_only,
    )?;
    results.info();

    println!(
        "{} players, {}: {} rounds",
        n_players,
        lineup.names().join(","),
        n_trials
    );
    println!(
        "score: {:.3} ± {:.3}",
        results.average_score(),
        results.score_stderr()
    );
    println!(
        "perfect: {:.2}% ± {:.2}%",
        results.percent_perfect(),
        results.percent_perfect_stderr()
    );
    if !results.tally.is_empty() {
        print!("fallbacks:\n{}", results.tally);
    }
    Ok(())
}
