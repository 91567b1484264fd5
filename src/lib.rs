//! Rule engine for two-player chess against a random mover: board model, move legality,
//! check detection, legal move enumeration, promotion and the turn controller.

pub mod board;
pub mod game;
pub mod move_generator;
pub mod move_validator;
pub mod moves;
pub mod perft;
pub mod promotion;
pub mod terminal;
