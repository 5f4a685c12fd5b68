pub mod local;
pub mod qdrant;

pub use local::{LocalCollection, LocalStore};
pub use qdrant::QdrantStore;
