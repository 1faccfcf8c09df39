//! Request-independent helpers shared by handlers.

pub mod cookies;
