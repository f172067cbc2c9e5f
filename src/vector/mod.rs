//! Vector Module
//!
//! Word vector table, similarity math, analogy solving and file formats.

mod analogy;
pub mod format;
mod similarity;
mod store;

pub use analogy::{AnalogyQuery, AnalogySolver};
pub use format::{write_table, LoadStage, VectorFormat};
pub use similarity::{dot_product, magnitude, normalize_vector, unit_similarity};
pub use store::{Neighbor, VectorStore, VectorTableBuilder};
