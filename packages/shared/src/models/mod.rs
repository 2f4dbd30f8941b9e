pub mod game;
pub mod requests;
