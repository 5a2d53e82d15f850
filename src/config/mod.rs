//! Process configuration, read once at startup from the environment.

mod secret;
mod settings;

pub use secret::Secret;
pub use settings::{DatabaseKind, Settings};
