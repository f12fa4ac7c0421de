pub mod writer;

pub use writer::{GENERATOR_NAME, OutputError, OutputWriter};
