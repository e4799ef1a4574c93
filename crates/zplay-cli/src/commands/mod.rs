/// `zplay games`
pub mod games;
/// `zplay health`
pub mod health;
/// `zplay play`
pub mod play;
