//! Vector database infrastructure.
//!
//! Provides LanceDB connection management and the `VectorMemoryStore`
//! implementation. Arrow schemas define the table structure; the vector
//! width is a per-collection parameter fixed at table creation.

pub mod lance;
pub mod memory;
pub mod schema;
