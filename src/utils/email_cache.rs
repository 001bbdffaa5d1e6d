use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use super::normalize_email;

/// Emails known to be taken.
static TAKEN_EMAILS: Lazy<Cache<String, ()>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(200_000)
        .time_to_live(Duration::from_secs(86_400))
        .build()
});

pub async fn mark_taken(email: &str) {
    TAKEN_EMAILS.insert(normalize_email(email), ()).await;
}

pub async fn is_taken(email: &str) -> bool {
    TAKEN_EMAILS.contains_key(&normalize_email(email))
}

/// Preload emails of users active in the last `days` days.
pub async fn warmup_email_cache(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT email
        FROM users
        WHERE last_login_at >= NOW() - INTERVAL ? DAY
        ORDER BY last_login_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (email,) = row?;
        batch.push(email);
        total += 1;

        if batch.len() >= batch_size {
            mark_batch(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        mark_batch(&batch).await;
    }

    log::info!("Email cache warmup complete: {} recent users (last {} days)", total, days);
    Ok(())
}

async fn mark_batch(emails: &[String]) {
    futures::future::join_all(emails.iter().map(|e| mark_taken(e))).await;
}
