// Orchestration around the scoring core: resilient AI calls, deterministic
// fallbacks, per-user throttling and the analysis response cache.

pub mod cache;
pub mod fallback;
pub mod handlers;
pub mod resilient;
pub mod service;
pub mod throttle;
