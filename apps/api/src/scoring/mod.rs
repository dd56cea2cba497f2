// Deterministic scoring and trend analytics. No I/O anywhere under this module.

pub mod domain;
pub mod trends;
