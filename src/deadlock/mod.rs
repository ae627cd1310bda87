// Deadlock Module
// RAG construction, cycle detection, Banker's safety, prevention policies

pub mod banker;
pub mod detector;
pub mod graph;
pub mod prevention;
pub mod types;
pub mod vector;

pub use banker::*;
pub use detector::*;
pub use graph::*;
pub use prevention::*;
pub use types::*;
