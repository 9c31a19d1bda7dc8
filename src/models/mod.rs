pub mod product;
pub mod stats;

// Re-exports for convenience
pub use product::*;
pub use stats::*;
