pub mod discovery;

pub use discovery::{DiscoveryError, discover_sources, expand_sources};
