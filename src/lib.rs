pub mod cards;
pub mod error;
pub mod game;
pub mod helpers;
pub mod hints;
pub mod info;
pub mod json_output;
pub mod simulator;
pub mod strategies;
pub mod strategy;

pub use error::GameError;
