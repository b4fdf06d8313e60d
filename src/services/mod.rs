pub mod bot_init;
pub mod expiring_cache;
pub mod storage;
