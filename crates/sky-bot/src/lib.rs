//! Sky: Children of the Light tools bot for OneBot (NapCat).

pub mod commands;
pub mod config;
pub mod delivery;
pub mod error;
pub mod metadata;
pub mod reports;
