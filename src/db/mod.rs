pub mod locks;
pub mod memory;
pub mod redis;
pub mod repository;
pub mod store;

pub use locks::InvestorLocks;
pub use memory::InMemoryStore;
pub use self::redis::{create_redis_client, RedisStore, StoreWriterHandle};
pub use repository::PreferenceRepository;
pub use store::{KeyValueStore, StoreKey};
