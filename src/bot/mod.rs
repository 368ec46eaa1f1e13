//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: commands, login, the tutor reply keyboard and dialogue input
//! - `callback_handler`: inline keyboard callback queries
//! - `dialogue_manager`: multi-step inputs and their validation
//! - `student_screens`, `parent_screens`, `tutor_screens`, `library`: menus per role
//! - `messaging`: chat relay, broadcasts and notifications
//! - `access`: who may see which student, lesson or homework
//! - `callback_data`: typed inline keyboard actions
//! - `ui_builder`: keyboards, formatting and message editing

pub mod access;
pub mod callback_data;
pub mod callback_handler;
pub mod dialogue_manager;
pub mod library;
pub mod message_handler;
pub mod messaging;
pub mod parent_screens;
pub mod student_screens;
pub mod tutor_screens;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::{message_handler, Command};

pub use callback_data::CallbackAction;
pub use messaging::{notify_family, notify_user};
