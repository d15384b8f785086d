pub mod cache;
pub mod memory;
pub mod redis;
pub mod store;

mod macros;

pub use cache::{Cache, CacheKey, CacheWriterHandle};
pub use memory::InMemoryStore;
pub use self::redis::{create_redis_client, RedisStore};
pub use store::{load_json, load_optional_json, save_json, KeyValueStore, StorageKey};
