pub mod signature;
pub mod normalizer;
pub mod store;
pub mod reconciler;

pub use signature::*;
pub use normalizer::*;
pub use store::*;
pub use reconciler::*;
