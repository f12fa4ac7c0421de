//! Rendering of template bodies: placeholders first, embedded spans second.

pub mod engine;

pub use engine::{SPAN_CLOSE, SPAN_OPEN, TemplateRenderError, TemplateRenderer};
