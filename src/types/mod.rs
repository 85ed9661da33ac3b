// Shared type definitions
// Each submodule defines records used across the models, the database gateway and the settings layer.

pub mod errors;
pub mod history;
pub mod page;
pub mod settings;
pub mod tab;
