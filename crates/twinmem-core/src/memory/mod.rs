//! Memory subsystem: store traits, triple extraction, and the dual-write
//! coordinator that ties them together.

pub mod coordinator;
pub mod extractor;
pub mod graph;
pub mod vector;
pub mod verifier;
