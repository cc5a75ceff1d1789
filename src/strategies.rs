use crate::error::GameError;
use crate::game::*;
use crate::strategy::GameStrategyConfig;

pub mod basic;
pub mod cheating;
pub mod encoding;
pub mod hat;
pub mod hat_helpers;
pub mod heuristic;

pub type BoxedConfig = Box<dyn GameStrategyConfig + Sync>;
pub type ConfigFactory = fn() -> BoxedConfig;

/// Strategy names and how to build them.
pub struct StrategyRegistry {
    factories: Vec<(&'static str, ConfigFactory)>,
}

impl StrategyRegistry {
    pub fn new() -> StrategyRegistry {
        StrategyRegistry {
            factories: Vec::new(),
        }
    }

    /// Every strategy shipped with the crate.
    pub fn standard() -> StrategyRegistry {
        let mut registry = StrategyRegistry::new();
        registry.register(hat::NAME, || Box::new(hat::HatConfig));
        registry.register(basic::NAME, || Box::new(basic::BasicConfig::basic()));
        registry.register(basic::RAINBOW_NAME, || Box::new(basic::BasicConfig::rainbow()));
        registry.register(cheating::CHEATER, || Box::new(cheating::CheatingConfig));
        registry.register(cheating::IDIOT, || Box::new(cheating::IdiotConfig));
        registry.register(heuristic::NAME, || Box::new(heuristic::HeuristicConfig));
        registry.register(encoding::NAME, || Box::new(encoding::EncodingConfig));
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: ConfigFactory) {
        self.factories.retain(|&(existing, _)| existing != name);
        self.factories.push((name, factory));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.factories.iter().map(|&(name, _)| name).collect()
    }

    pub fn build(&self, name: &str) -> Result<BoxedConfig, GameError> {
        self.factories
            .iter()
            .find(|&&(existing, _)| existing == name)
            .map(|&(_, factory)| factory())
            .ok_or_else(|| GameError::UnknownStrategy {
                name: name.to_string(),
            })
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// One strategy per seat, in turn order.
pub struct Lineup {
    seats: Vec<BoxedConfig>,
}

impl Lineup {
    pub fn new<S: AsRef<str>>(registry: &StrategyRegistry, names: &[S]) -> Result<Lineup, GameError> {
        let seats = names
            .iter()
            .map(|name| registry.build(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Lineup { seats })
    }

    /// The same strategy in every seat.
    pub fn uniform(
        registry: &StrategyRegistry,
        name: &str,
        num_players: u32,
    ) -> Result<Lineup, GameError> {
        let names = vec![name; num_players as usize];
        Lineup::new(registry, &names)
    }

    pub fn len(&self) -> u32 {
        self.seats.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.seats.iter().map(|config| config.name()).collect()
    }

    pub fn seat(&self, player: Player) -> &(dyn GameStrategyConfig + Sync) {
        self.seats[player as usize].as_ref()
    }

    /// Rejects the table before any card is dealt.
    pub fn check(&self, opts: &GameOptions) -> Result<(), GameError> {
        if self.len() != opts.num_players {
            return Err(GameError::BadOption(format!(
                "{} strategies given for {} players",
                self.len(),
                opts.num_players
            )));
        }
        let names = self.names();
        for config in &self.seats {
            config.check_table(opts, &names)?;
        }
        Ok(())
    }
}
