pub mod bench;
pub mod external;
pub mod mock;
pub mod model;
pub mod pooled;
pub mod reactive;
pub mod server;
pub mod service;
pub mod store;
pub mod threaded;
pub mod utils;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
