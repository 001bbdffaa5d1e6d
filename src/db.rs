use sqlx::MySqlPool;

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPool::connect(database_url).await
}

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
    email VARCHAR(255) NOT NULL UNIQUE,
    password VARCHAR(255) NOT NULL,
    role_id TINYINT UNSIGNED NOT NULL DEFAULT 3,
    last_login_at DATETIME NULL
)"#;

const CREATE_REFRESH_TOKENS: &str = r#"
CREATE TABLE IF NOT EXISTS refresh_tokens (
    id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
    user_id BIGINT UNSIGNED NOT NULL,
    jti VARCHAR(64) NOT NULL UNIQUE,
    expires_at DATETIME NOT NULL,
    revoked TINYINT(1) NOT NULL DEFAULT 0
)"#;

const CREATE_ATTENDANCE: &str = r#"
CREATE TABLE IF NOT EXISTS attendance (
    id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
    uid BIGINT UNSIGNED NOT NULL,
    name VARCHAR(255) NOT NULL,
    `timestamp` DATETIME(3) NOT NULL,
    type VARCHAR(10) NOT NULL,
    photo MEDIUMBLOB NOT NULL,
    time_note VARCHAR(255) NOT NULL,
    INDEX idx_attendance_uid_type (uid, type)
)"#;

const CREATE_SCHEDULE: &str = r#"
CREATE TABLE IF NOT EXISTS schedule (
    day VARCHAR(16) PRIMARY KEY,
    entry_time VARCHAR(16) NOT NULL,
    exit_time VARCHAR(16) NOT NULL
)"#;

const CREATE_GEOFENCE: &str = r#"
CREATE TABLE IF NOT EXISTS geofence (
    id TINYINT UNSIGNED PRIMARY KEY,
    ref_lat DOUBLE NOT NULL,
    ref_lng DOUBLE NOT NULL,
    limit_m DOUBLE NOT NULL
)"#;

/// Create every table the service needs. Safe to run on each boot.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    for ddl in [
        CREATE_USERS,
        CREATE_REFRESH_TOKENS,
        CREATE_ATTENDANCE,
        CREATE_SCHEDULE,
        CREATE_GEOFENCE,
    ] {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
