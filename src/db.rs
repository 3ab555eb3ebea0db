use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::{debug, info};

/// Represents a registered user in the database
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub points: i64,
    pub is_banned: bool,
    pub registration_date: DateTime<Utc>,
}

/// Represents a submitted channel link
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: i64,
    pub added_by: i64,
    pub youtube_link: String,
    pub description: String,
    pub channel_id: String,
    /// Display name of the submitting user, denormalized for the task list
    pub adder: String,
    pub subscription_count: i32,
    pub payment_id: Option<String>,
    pub submission_date: DateTime<Utc>,
}

/// Represents a withdrawal request
#[derive(Debug, Clone, PartialEq)]
pub struct Withdrawal {
    pub id: i64,
    pub telegram_id: i64,
    pub full_name: String,
    pub phone: String,
    pub carrier: String,
    pub amount: i64,
    pub status: String,
    pub withdrawal_date: DateTime<Utc>,
    pub processed_date: Option<DateTime<Utc>>,
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            telegram_id BIGINT UNIQUE NOT NULL,
            full_name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL,
            phone VARCHAR(32) NOT NULL,
            country VARCHAR(64) DEFAULT 'Unknown',
            points BIGINT DEFAULT 0,
            is_banned BOOLEAN DEFAULT FALSE,
            registration_date TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS links (
            id BIGSERIAL PRIMARY KEY,
            added_by BIGINT NOT NULL,
            youtube_link TEXT NOT NULL,
            description TEXT NOT NULL,
            channel_id VARCHAR(64) NOT NULL,
            adder VARCHAR(255) NOT NULL,
            subscription_count INTEGER NOT NULL DEFAULT 100,
            payment_id VARCHAR(64),
            submission_date TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create links table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS likes (
            link_id BIGINT PRIMARY KEY REFERENCES links(id) ON DELETE CASCADE,
            channel_likes BIGINT DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create likes table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_link_status (
            id BIGSERIAL PRIMARY KEY,
            telegram_id BIGINT NOT NULL,
            link_id BIGINT NOT NULL,
            channel_id VARCHAR(64) NOT NULL,
            processed INTEGER DEFAULT 0,
            UNIQUE(telegram_id, link_id)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create user_link_status table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS link_messages (
            telegram_id BIGINT NOT NULL,
            chat_id BIGINT NOT NULL,
            link_id BIGINT NOT NULL,
            message_id INTEGER NOT NULL,
            UNIQUE(telegram_id, chat_id, link_id)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create link_messages table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS withdrawals (
            id BIGSERIAL PRIMARY KEY,
            telegram_id BIGINT NOT NULL,
            full_name VARCHAR(255) NOT NULL,
            phone VARCHAR(32) NOT NULL,
            carrier VARCHAR(64) NOT NULL,
            amount BIGINT NOT NULL,
            status VARCHAR(16) DEFAULT 'pending',
            withdrawal_date TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP,
            processed_date TIMESTAMPTZ
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create withdrawals table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS authorized_link_adders (
            telegram_id BIGINT PRIMARY KEY,
            full_name VARCHAR(255),
            email VARCHAR(255),
            added_by BIGINT
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create authorized_link_adders table")?;

    // Indexes for the hot queries
    sqlx::query("CREATE INDEX IF NOT EXISTS links_added_by_idx ON links(added_by)")
        .execute(pool)
        .await
        .context("Failed to create links added_by index")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS user_link_status_telegram_idx ON user_link_status(telegram_id)",
    )
    .execute(pool)
    .await
    .context("Failed to create user_link_status index")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS withdrawals_status_idx ON withdrawals(status)")
        .execute(pool)
        .await
        .context("Failed to create withdrawals status index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get(0),
        telegram_id: row.get(1),
        full_name: row.get(2),
        email: row.get(3),
        phone: row.get(4),
        country: row.get(5),
        points: row.get(6),
        is_banned: row.get(7),
        registration_date: row.get(8),
    }
}

const USER_COLUMNS: &str =
    "id, telegram_id, full_name, email, phone, country, points, is_banned, registration_date";

/// Create a new user
pub async fn create_user(
    pool: &PgPool,
    telegram_id: i64,
    full_name: &str,
    email: &str,
    phone: &str,
    country: &str,
) -> Result<i64> {
    debug!(telegram_id = %telegram_id, "Creating new user");

    let row = sqlx::query(
        "INSERT INTO users (telegram_id, full_name, email, phone, country) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(telegram_id)
    .bind(full_name)
    .bind(email)
    .bind(phone)
    .bind(country)
    .fetch_one(pool)
    .await
    .context("Failed to insert new user")?;

    let user_id: i64 = row.get(0);
    debug!(user_id = %user_id, "User created successfully");
    Ok(user_id)
}

/// Get a user by Telegram ID
pub async fn get_user_by_telegram_id(pool: &PgPool, telegram_id: i64) -> Result<Option<User>> {
    debug!(telegram_id = %telegram_id, "Getting user by telegram_id");

    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE telegram_id = $1",
        USER_COLUMNS
    ))
    .bind(telegram_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by telegram_id")?;

    Ok(row.map(|row| user_from_row(&row)))
}

/// Check if a user is registered
pub async fn is_registered(pool: &PgPool, telegram_id: i64) -> Result<bool> {
    let row = sqlx::query("SELECT 1 FROM users WHERE telegram_id = $1")
        .bind(telegram_id)
        .fetch_optional(pool)
        .await
        .context("Failed to check registration")?;
    Ok(row.is_some())
}

/// Check if a user is banned
pub async fn is_banned(pool: &PgPool, telegram_id: i64) -> Result<bool> {
    let row = sqlx::query("SELECT is_banned FROM users WHERE telegram_id = $1")
        .bind(telegram_id)
        .fetch_optional(pool)
        .await
        .context("Failed to check ban status")?;
    Ok(row.map(|r| r.get::<bool, _>(0)).unwrap_or(false))
}

/// Set or clear the ban flag for a user
pub async fn set_banned(pool: &PgPool, telegram_id: i64, banned: bool) -> Result<bool> {
    info!(telegram_id = %telegram_id, banned = banned, "Updating ban status");

    let result = sqlx::query("UPDATE users SET is_banned = $1 WHERE telegram_id = $2")
        .bind(banned)
        .bind(telegram_id)
        .execute(pool)
        .await
        .context("Failed to update ban status")?;

    Ok(result.rows_affected() > 0)
}

/// Increment a user's points. The increment happens in a single statement,
/// so concurrent awards cannot lose updates.
pub async fn add_points(pool: &PgPool, telegram_id: i64, points: i64) -> Result<()> {
    debug!(telegram_id = %telegram_id, points = points, "Adding points");

    sqlx::query("UPDATE users SET points = points + $1 WHERE telegram_id = $2")
        .bind(points)
        .bind(telegram_id)
        .execute(pool)
        .await
        .context("Failed to add points")?;

    Ok(())
}

fn link_from_row(row: &sqlx::postgres::PgRow) -> Link {
    Link {
        id: row.get(0),
        added_by: row.get(1),
        youtube_link: row.get(2),
        description: row.get(3),
        channel_id: row.get(4),
        adder: row.get(5),
        subscription_count: row.get(6),
        payment_id: row.get(7),
        submission_date: row.get(8),
    }
}

const LINK_COLUMNS: &str = "id, added_by, youtube_link, description, channel_id, adder, \
                            subscription_count, payment_id, submission_date";

/// Create a new channel link plus its likes counter row
pub async fn create_link(
    pool: &PgPool,
    added_by: i64,
    youtube_link: &str,
    description: &str,
    channel_id: &str,
    adder: &str,
    subscription_count: i32,
) -> Result<i64> {
    debug!(added_by = %added_by, channel_id = %channel_id, "Creating new link");

    let row = sqlx::query(
        "INSERT INTO links (added_by, youtube_link, description, channel_id, adder, subscription_count) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(added_by)
    .bind(youtube_link)
    .bind(description)
    .bind(channel_id)
    .bind(adder)
    .bind(subscription_count)
    .fetch_one(pool)
    .await
    .context("Failed to insert new link")?;

    let link_id: i64 = row.get(0);

    sqlx::query("INSERT INTO likes (link_id, channel_likes) VALUES ($1, 0) ON CONFLICT DO NOTHING")
        .bind(link_id)
        .execute(pool)
        .await
        .context("Failed to insert likes row")?;

    debug!(link_id = %link_id, "Link created successfully");
    Ok(link_id)
}

/// Check whether the user already submitted this channel (by ID or name)
pub async fn find_duplicate_link(
    pool: &PgPool,
    added_by: i64,
    channel_id: &str,
    description: &str,
) -> Result<bool> {
    let row = sqlx::query(
        "SELECT 1 FROM links WHERE added_by = $1 AND (channel_id = $2 OR description = $3)",
    )
    .bind(added_by)
    .bind(channel_id)
    .bind(description)
    .fetch_optional(pool)
    .await
    .context("Failed to check for duplicate link")?;

    Ok(row.is_some())
}

/// Get a single link by ID
pub async fn get_link(pool: &PgPool, link_id: i64) -> Result<Option<Link>> {
    let row = sqlx::query(&format!("SELECT {} FROM links WHERE id = $1", LINK_COLUMNS))
        .bind(link_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get link")?;

    Ok(row.map(|row| link_from_row(&row)))
}

/// Links still available for a user: everything they have not processed yet,
/// excluding their own submissions. Paginated, newest first.
pub async fn list_available_links(
    pool: &PgPool,
    telegram_id: i64,
    page: i64,
    per_page: i64,
) -> Result<(Vec<Link>, i64)> {
    debug!(telegram_id = %telegram_id, page = page, "Listing available links");

    let rows = sqlx::query(&format!(
        "SELECT {} FROM links l \
         LEFT JOIN user_link_status uls \
            ON l.id = uls.link_id AND uls.telegram_id = $1 \
         WHERE (uls.processed IS NULL OR uls.processed = 0) AND l.added_by <> $1 \
         ORDER BY l.id DESC LIMIT $2 OFFSET $3",
        "l.id, l.added_by, l.youtube_link, l.description, l.channel_id, l.adder, \
         l.subscription_count, l.payment_id, l.submission_date"
    ))
    .bind(telegram_id)
    .bind(per_page)
    .bind(page * per_page)
    .fetch_all(pool)
    .await
    .context("Failed to list available links")?;

    let links: Vec<Link> = rows.iter().map(link_from_row).collect();

    let total: i64 = sqlx::query(
        "SELECT COUNT(*) FROM links l \
         LEFT JOIN user_link_status uls \
            ON l.id = uls.link_id AND uls.telegram_id = $1 \
         WHERE (uls.processed IS NULL OR uls.processed = 0) AND l.added_by <> $1",
    )
    .bind(telegram_id)
    .fetch_one(pool)
    .await
    .context("Failed to count available links")?
    .get(0);

    let total_pages = if total > 0 {
        (total + per_page - 1) / per_page
    } else {
        0
    };

    Ok((links, total_pages))
}

/// All links submitted by a user, newest first
pub async fn list_user_links(pool: &PgPool, added_by: i64) -> Result<Vec<Link>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM links WHERE added_by = $1 ORDER BY submission_date DESC",
        LINK_COLUMNS
    ))
    .bind(added_by)
    .fetch_all(pool)
    .await
    .context("Failed to list user links")?;

    Ok(rows.iter().map(link_from_row).collect())
}

/// Paid links (payment ID attached) with their like counters, newest first
pub async fn list_user_links_with_likes(
    pool: &PgPool,
    added_by: i64,
) -> Result<Vec<(Link, i64)>> {
    let rows = sqlx::query(
        "SELECT l.id, l.added_by, l.youtube_link, l.description, l.channel_id, l.adder, \
                l.subscription_count, l.payment_id, l.submission_date, \
                COALESCE(k.channel_likes, 0) AS likes_count \
         FROM links l \
         LEFT JOIN likes k ON l.id = k.link_id \
         WHERE l.added_by = $1 AND l.payment_id IS NOT NULL \
         ORDER BY l.submission_date DESC",
    )
    .bind(added_by)
    .fetch_all(pool)
    .await
    .context("Failed to list user links with likes")?;

    Ok(rows
        .iter()
        .map(|row| (link_from_row(row), row.get::<i64, _>(9)))
        .collect())
}

/// Attach a payment ID to one of the user's channels (matched by description)
pub async fn set_payment_id(
    pool: &PgPool,
    added_by: i64,
    description: &str,
    payment_id: &str,
) -> Result<bool> {
    info!(added_by = %added_by, description = %description, "Setting payment ID");

    let result =
        sqlx::query("UPDATE links SET payment_id = $1 WHERE description = $2 AND added_by = $3")
            .bind(payment_id)
            .bind(description)
            .bind(added_by)
            .execute(pool)
            .await
            .context("Failed to set payment ID")?;

    Ok(result.rows_affected() > 0)
}

/// Delete a link by its channel description
pub async fn delete_link_by_description(pool: &PgPool, description: &str) -> Result<bool> {
    info!(description = %description, "Deleting link by description");

    let result = sqlx::query("DELETE FROM links WHERE description = $1")
        .bind(description)
        .execute(pool)
        .await
        .context("Failed to delete link")?;

    Ok(result.rows_affected() > 0)
}

/// Mark a link as processed for a user. Upserted so a repeated verification
/// of the same (user, link) pair stays marked exactly once.
pub async fn mark_link_processed(
    pool: &PgPool,
    telegram_id: i64,
    link_id: i64,
    channel_id: &str,
) -> Result<()> {
    debug!(telegram_id = %telegram_id, link_id = %link_id, "Marking link processed");

    sqlx::query(
        "INSERT INTO user_link_status (telegram_id, link_id, channel_id, processed) \
         VALUES ($1, $2, $3, 1) \
         ON CONFLICT (telegram_id, link_id) DO UPDATE SET processed = EXCLUDED.processed",
    )
    .bind(telegram_id)
    .bind(link_id)
    .bind(channel_id)
    .execute(pool)
    .await
    .context("Failed to mark link processed")?;

    Ok(())
}

/// Increment a link's like counter
pub async fn increment_link_likes(pool: &PgPool, link_id: i64) -> Result<()> {
    sqlx::query(
        "INSERT INTO likes (link_id, channel_likes) VALUES ($1, 1) \
         ON CONFLICT (link_id) DO UPDATE SET channel_likes = likes.channel_likes + 1",
    )
    .bind(link_id)
    .execute(pool)
    .await
    .context("Failed to increment link likes")?;

    Ok(())
}

/// Store the Telegram message ID shown for a (user, chat, link) triple
pub async fn store_message_id(
    pool: &PgPool,
    telegram_id: i64,
    chat_id: i64,
    link_id: i64,
    message_id: i32,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO link_messages (telegram_id, chat_id, link_id, message_id) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (telegram_id, chat_id, link_id) DO UPDATE SET message_id = EXCLUDED.message_id",
    )
    .bind(telegram_id)
    .bind(chat_id)
    .bind(link_id)
    .bind(message_id)
    .execute(pool)
    .await
    .context("Failed to store message ID")?;

    Ok(())
}

/// Get the stored message ID for a (user, chat, link) triple
pub async fn get_message_id(
    pool: &PgPool,
    telegram_id: i64,
    chat_id: i64,
    link_id: i64,
) -> Result<Option<i32>> {
    let row = sqlx::query(
        "SELECT message_id FROM link_messages \
         WHERE telegram_id = $1 AND chat_id = $2 AND link_id = $3",
    )
    .bind(telegram_id)
    .bind(chat_id)
    .bind(link_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get message ID")?;

    Ok(row.map(|r| r.get(0)))
}

fn withdrawal_from_row(row: &sqlx::postgres::PgRow) -> Withdrawal {
    Withdrawal {
        id: row.get(0),
        telegram_id: row.get(1),
        full_name: row.get(2),
        phone: row.get(3),
        carrier: row.get(4),
        amount: row.get(5),
        status: row.get(6),
        withdrawal_date: row.get(7),
        processed_date: row.get(8),
    }
}

const WITHDRAWAL_COLUMNS: &str = "id, telegram_id, full_name, phone, carrier, amount, status, \
                                  withdrawal_date, processed_date";

/// Create a withdrawal request, deducting the amount from the balance in the
/// same statement so a double-submit cannot overdraw. Returns the request ID
/// or `None` when the balance is insufficient.
pub async fn create_withdrawal(
    pool: &PgPool,
    telegram_id: i64,
    carrier: &str,
    amount: i64,
) -> Result<Option<i64>> {
    info!(telegram_id = %telegram_id, amount = amount, "Creating withdrawal request");

    let deducted = sqlx::query(
        "UPDATE users SET points = points - $1 WHERE telegram_id = $2 AND points >= $1",
    )
    .bind(amount)
    .bind(telegram_id)
    .execute(pool)
    .await
    .context("Failed to deduct withdrawal amount")?;

    if deducted.rows_affected() == 0 {
        info!(telegram_id = %telegram_id, "Insufficient balance for withdrawal");
        return Ok(None);
    }

    let row = sqlx::query(
        "INSERT INTO withdrawals (telegram_id, full_name, phone, carrier, amount) \
         SELECT telegram_id, full_name, phone, $2, $3 FROM users WHERE telegram_id = $1 \
         RETURNING id",
    )
    .bind(telegram_id)
    .bind(carrier)
    .bind(amount)
    .fetch_one(pool)
    .await
    .context("Failed to insert withdrawal request")?;

    Ok(Some(row.get(0)))
}

/// Paginated withdrawals filtered by status, newest first
pub async fn list_withdrawals(
    pool: &PgPool,
    status: &str,
    page: i64,
    per_page: i64,
) -> Result<(Vec<Withdrawal>, i64)> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM withdrawals WHERE status = $1 \
         ORDER BY withdrawal_date DESC LIMIT $2 OFFSET $3",
        WITHDRAWAL_COLUMNS
    ))
    .bind(status)
    .bind(per_page)
    .bind(page * per_page)
    .fetch_all(pool)
    .await
    .context("Failed to list withdrawals")?;

    let withdrawals: Vec<Withdrawal> = rows.iter().map(withdrawal_from_row).collect();

    let total: i64 = sqlx::query("SELECT COUNT(*) FROM withdrawals WHERE status = $1")
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count withdrawals")?
        .get(0);

    let total_pages = if total > 0 {
        (total + per_page - 1) / per_page
    } else {
        0
    };

    Ok((withdrawals, total_pages))
}

/// Get a single withdrawal by ID
pub async fn get_withdrawal(pool: &PgPool, withdrawal_id: i64) -> Result<Option<Withdrawal>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM withdrawals WHERE id = $1",
        WITHDRAWAL_COLUMNS
    ))
    .bind(withdrawal_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get withdrawal")?;

    Ok(row.map(|row| withdrawal_from_row(&row)))
}

/// Mark a withdrawal as processed, stamping the processing time
pub async fn mark_withdrawal_processed(pool: &PgPool, withdrawal_id: i64) -> Result<bool> {
    info!(withdrawal_id = %withdrawal_id, "Marking withdrawal processed");

    let result = sqlx::query(
        "UPDATE withdrawals SET status = 'processed', processed_date = CURRENT_TIMESTAMP \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(withdrawal_id)
    .execute(pool)
    .await
    .context("Failed to mark withdrawal processed")?;

    Ok(result.rows_affected() > 0)
}
