pub mod matcher;
pub mod normalizer;

pub use matcher::TargetMatcher;
pub use normalizer::PriceNormalizer;
