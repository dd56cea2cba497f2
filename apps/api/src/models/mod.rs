pub mod analysis;
pub mod chat;
pub mod insight;
pub mod logs;
pub mod user;
