pub mod app_config;
pub mod events;
pub mod keys;
pub mod memory;
pub mod redis_lock;
pub mod redis_store;

pub use app_config::Config;
pub use events::RedisSaleNotifier;
pub use memory::{MemoryLockProvider, MemorySeatStore};
pub use redis_lock::RedisLockProvider;
pub use redis_store::RedisSeatStore;
