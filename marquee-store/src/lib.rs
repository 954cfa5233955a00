pub mod app_config;
pub mod database;
pub mod booking_repo;
pub mod ledger_client;
pub mod memory;
pub mod redis_repo;
pub mod events;
pub mod email;
pub mod notifiers;

pub use database::DbClient;
pub use booking_repo::PgBookingRepository;
pub use ledger_client::HttpSeatLedger;
pub use memory::{InMemoryBookingRepository, InMemorySeatLedger, RecordingNotifier};
pub use redis_repo::RedisClient;
pub use events::{EventProducer, KafkaNotifier};
pub use email::EmailNotifier;
pub use notifiers::{FanoutNotifier, LogNotifier};
