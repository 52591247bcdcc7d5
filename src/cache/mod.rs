// AI answer cache module

pub mod manager;
pub mod models;

pub use manager::ConversionCache;
pub use models::CacheStats;
