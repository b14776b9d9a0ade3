//! One publication pass: accepted folder in, SMTP fan-out, published folder out.

pub mod runner;

pub use runner::{PassReport, PublicationPipeline};
