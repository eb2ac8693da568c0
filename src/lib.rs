// Library crate exposing modules for the binary and integration tests

pub mod config;
pub mod logging;
pub mod model;
pub mod repository;
pub mod status;
pub mod util;
