//! # Tutoring Telegram Bot
//!
//! A Telegram bot for a private tutor: students and parents log in with an
//! access code, the tutor keeps lessons, homework, payments and materials,
//! and students collect points and achievements along the way.

pub mod access_code;
pub mod bot;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod gamification;
pub mod lesson_shift;
pub mod localization;
pub mod models;
pub mod reminders;
pub mod schedule;
