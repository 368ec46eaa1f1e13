//! # Bot Configuration Module
//!
//! Runtime settings read from the environment plus the fixed rules of the
//! tutoring workflow (points, limits, reminder windows).

use anyhow::{Context, Result};
use std::env;

// Gamification rules
pub const POINTS_FOR_ATTENDANCE: i64 = 10;
pub const POINTS_FOR_MASTERY: i64 = 25;
pub const POINTS_FOR_HOMEWORK: i64 = 15;
/// Maximum gap between two attended lessons that still extends a streak
pub const STREAK_MAX_GAP_DAYS: i64 = 8;

// Listing limits
pub const UPCOMING_LESSONS_LIMIT: i64 = 10;
pub const LESSON_HISTORY_LIMIT: i64 = 20;
pub const RECENT_PAYMENTS_LIMIT: i64 = 5;
pub const ATTENDANCE_WINDOW_DAYS: i64 = 30;

// Input limits
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_TOPIC_LENGTH: usize = 255;
pub const MAX_TEXT_LENGTH: usize = 2000;
pub const MAX_LESSONS_PER_PAYMENT: i64 = 100;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://tutorbot.db";
/// Europe/Kaliningrad
pub const DEFAULT_TIMEZONE_OFFSET_HOURS: i32 = 2;

/// Settings for the background reminder task
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// Seconds between two reminder passes
    pub interval_secs: u64,
    /// How far ahead of a lesson or deadline the reminder is sent
    pub lead_time_hours: i64,
    /// Local hour at which low balance notices go out
    pub low_balance_hour: u32,
    /// Balance (in lessons) that triggers the notice
    pub low_balance_threshold: i64,
    /// Weeks of lessons created by the weekly schedule generator
    pub schedule_weeks: u32,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600, // 1 hour
            lead_time_hours: 24,
            low_balance_hour: 10,
            low_balance_threshold: 1,
            schedule_weeks: 4,
        }
    }
}

/// Top-level bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub database_url: String,
    /// Telegram id allowed to run admin commands and receive error reports
    pub admin_telegram_id: Option<i64>,
    pub timezone_offset_hours: i32,
    pub reminders: ReminderConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            admin_telegram_id: None,
            timezone_offset_hours: DEFAULT_TIMEZONE_OFFSET_HOURS,
            reminders: ReminderConfig::default(),
        }
    }
}

impl BotConfig {
    /// Build the configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bot_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let admin_telegram_id = match env::var("ADMIN_TELEGRAM_ID") {
            Ok(value) if !value.trim().is_empty() => Some(
                value
                    .trim()
                    .parse()
                    .context("ADMIN_TELEGRAM_ID must be a numeric Telegram id")?,
            ),
            _ => None,
        };

        let timezone_offset_hours = parse_env_or("TIMEZONE_OFFSET_HOURS", defaults.timezone_offset_hours)?;
        if !(-12..=14).contains(&timezone_offset_hours) {
            anyhow::bail!("TIMEZONE_OFFSET_HOURS out of range: {timezone_offset_hours}");
        }

        let mut reminders = defaults.reminders;
        reminders.interval_secs = parse_env_or("REMINDER_INTERVAL_SECS", reminders.interval_secs)?;
        reminders.low_balance_hour = parse_env_or("LOW_BALANCE_HOUR", reminders.low_balance_hour)?;
        if reminders.interval_secs == 0 {
            anyhow::bail!("REMINDER_INTERVAL_SECS must be positive");
        }
        if reminders.low_balance_hour > 23 {
            anyhow::bail!("LOW_BALANCE_HOUR must be between 0 and 23");
        }

        Ok(Self {
            bot_token,
            database_url,
            admin_telegram_id,
            timezone_offset_hours,
            reminders,
        })
    }

    pub fn is_admin(&self, telegram_id: i64) -> bool {
        self.admin_telegram_id == Some(telegram_id)
    }
}

fn parse_env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {name}: {value}")),
        _ => Ok(default),
    }
}
