pub mod catalog;
pub mod config;
pub mod conversation;
pub mod defaults;
pub mod hardware;
pub mod ollama;
pub mod recommend;
pub mod resources;
pub mod settings;

pub use defaults::{GenerationDefaults, defaults_for};
pub use hardware::{HardwareProfile, SystemSpecs};
pub use recommend::{Recommendation, recommend};
