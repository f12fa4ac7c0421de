#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod combinations;
pub mod config;
pub mod directives;
pub mod expr;
pub mod generator;
pub mod output;
pub mod sources;
pub mod templates;
