pub mod store;

pub use store::create_redis_client;
pub use store::RedisStore;
pub use store::StoreWriterHandle;
