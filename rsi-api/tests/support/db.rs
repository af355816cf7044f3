use rsi_api::{DbConfig, PgStore};

pub async fn test_pg_store() -> PgStore {
    let config = DbConfig::from_env();
    let store = PgStore::from_config(&config).expect("Failed to create database store");
    store
        .ensure_schema()
        .await
        .expect("Failed to prepare database schema");
    store
}
