pub mod validation;

pub use validation::{CacheKey, ValidationCache};
