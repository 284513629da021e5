//! Text-to-vector conversion.
//!
//! - `Embedder`: RPITIT trait implemented by concrete backends in twinmem-infra
//! - `BoxEmbedder`: object-safe wrapper for runtime backend selection
//! - `DimensionAdapter`: pads raw vectors up to a collection's width

pub mod adapter;
pub mod box_embedder;
pub mod embedder;
