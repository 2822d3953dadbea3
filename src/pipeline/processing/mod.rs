// Value normalization for extracted page text

pub mod normalize;

pub use normalize::{normalize_name, normalize_price};
