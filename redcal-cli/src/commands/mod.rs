pub mod book;
pub mod config;
pub mod delete;
pub mod edit;
pub mod issues;
pub mod list;
pub mod login;
pub mod new;
pub mod open;
pub mod push;
pub mod revert;
pub mod status;

/// Days shown by `list` when no range is given.
pub const LIST_DAYS: i64 = 7;
