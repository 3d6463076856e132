#![allow(clippy::too_many_arguments)]

pub mod app;
pub mod cli;
pub mod config;
pub mod gesture;
pub mod io;
pub mod logger;
pub mod render;
pub mod transform;
