//! External dependency implementations (ports + adapters).

pub mod export;
pub mod extraction;
pub mod narrative;
pub mod openai;
pub mod ports;
pub mod settings;
