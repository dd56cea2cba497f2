// Conversational coaching: session lifecycle, per-message reply strategies,
// image handling and fallback titles.

pub mod handlers;
pub mod orchestrator;
pub mod strategy;
pub mod titles;
pub mod vision;
