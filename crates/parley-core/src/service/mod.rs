//! Application services built on the repository ports.

pub mod user;
