use crate::config::{load_config, Config};
use crate::db::UserRow;
use crate::pipeline::{UserRecord, NO_IMAGE};

/// Check if a test is enabled via environment variable
fn is_test_enabled(env_var: &str) -> bool {
    std::env::var(env_var)
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Check if database tests are enabled via environment variable
pub fn is_db_enabled() -> bool {
    is_test_enabled("ENABLE_DB_TESTS")
}

/// Check if S3 tests are enabled via environment variable
pub fn is_s3_enabled() -> bool {
    is_test_enabled("ENABLE_S3_TESTS")
}

/// Load test configuration from config.toml
pub fn load_test_config() -> Result<Config, anyhow::Error> {
    let config_path = "config.toml";

    load_config(config_path).map_err(|e| anyhow::anyhow!("Failed to load config.toml: {}", e))
}

/// Creates a users-table row with placeholder names and no image
pub fn create_test_user_row(user_id: &str) -> UserRow {
    UserRow {
        user_id: user_id.to_string(),
        first_name: format!("First{}", user_id),
        last_name: format!("Last{}", user_id),
        birthdate: "612302400000".to_string(),
        img_path: NO_IMAGE.to_string(),
    }
}

/// Creates a UserRecord with the given names and birth timestamp and no image
pub fn create_test_user_record(
    user_id: &str,
    first_name: &str,
    last_name: &str,
    birthts: &str,
) -> UserRecord {
    UserRecord {
        user_id: user_id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        birthts: birthts.to_string(),
        img_path: NO_IMAGE.to_string(),
    }
}

/// Body of a valid per-user source CSV
pub fn source_csv(first_name: &str, last_name: &str, birthts: &str) -> String {
    format!(
        "first_name,last_name,birthts\n{},{},{}\n",
        first_name, last_name, birthts
    )
}
