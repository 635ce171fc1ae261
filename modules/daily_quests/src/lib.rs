// === PUBLIC CONTRACT ===
// Other modules and binaries consume the daily quest pipeline through `contract`.
pub mod contract;

pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod config;
pub mod module;
pub use config::DailyQuestsConfig;
pub use module::DailyQuests;

// === INTERNAL MODULES ===
// Exposed for tests and wiring only; external consumers should stick to `contract`.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
