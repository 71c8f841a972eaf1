pub mod builder;
mod error;
pub mod retriever;
pub mod store;
pub mod vector;

pub use builder::{DEFAULT_BATCH_SIZE, IndexBuilder};
pub use error::{IndexError, Result};
pub use retriever::{DEFAULT_K, retrieve};
pub use store::DurableStore;
pub use vector::{FlatL2Index, Neighbor, VectorIndex};
