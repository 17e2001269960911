pub mod dexscreener_models;

pub use dexscreener_models::*;
