pub mod assemble;
pub mod chapter;
pub mod config;
pub mod error;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod similarity;
pub mod storage;
pub mod variants;

pub use error::HonyaError;
