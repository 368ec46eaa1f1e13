//! Parent menus. Parents read their children's data; they change nothing.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::db;
use crate::localization::{t_args_lang, t_lang};
use crate::models::User;

use super::callback_data::CallbackAction;
use super::ui_builder::{back_row, button, esc, Screen};

/// Entry screen of a parent: the only child's menu, or a list to pick from
pub async fn parent_menu(pool: &SqlitePool, parent: &User, language_code: Option<&str>) -> Result<Screen> {
    let children = db::list_children(pool, parent.id).await?;

    if let [child] = children.as_slice() {
        return Ok(child_menu(child, false, language_code));
    }

    let mut text = format!(
        "👋 {}\n\n",
        t_args_lang("parent-menu-title", &[("name", &esc(&parent.full_name))], language_code)
    );
    let mut rows = Vec::new();

    if children.is_empty() {
        text.push_str(&t_lang("parent-no-children", language_code));
    } else {
        text.push_str(&t_lang("parent-select-child", language_code));
    }
    for child in &children {
        rows.push(vec![button(format!("👤 {}", child.full_name), CallbackAction::Child(child.id))]);
    }
    rows.push(vec![button(
        format!("📖 {}", t_lang("menu-library", language_code)),
        CallbackAction::Library(None),
    )]);
    rows.push(vec![button(
        format!("💬 {}", t_lang("menu-chat", language_code)),
        CallbackAction::ChatWithTutor,
    )]);

    Ok(Screen::new(text, rows))
}

/// Menu for one child. `has_siblings` adds a way back to the child list.
pub fn child_menu(child: &User, has_siblings: bool, language_code: Option<&str>) -> Screen {
    let text = format!(
        "👤 <b>{}</b>\n\n⭐ {}",
        esc(&child.full_name),
        t_args_lang(
            "student-menu-points",
            &[
                ("points", &child.points.to_string()),
                ("streak", &child.streak_days.to_string())
            ],
            language_code
        )
    );

    let mut rows = vec![
        vec![
            button(format!("🏆 {}", t_lang("menu-progress", language_code)), CallbackAction::ChildProgress(child.id)),
            button(format!("🗓 {}", t_lang("menu-schedule", language_code)), CallbackAction::ChildSchedule(child.id)),
        ],
        vec![
            button(format!("💳 {}", t_lang("menu-payments", language_code)), CallbackAction::ChildPayments(child.id)),
            button(format!("📝 {}", t_lang("menu-homework", language_code)), CallbackAction::ChildHomework(child.id)),
        ],
        vec![
            button(format!("📖 {}", t_lang("menu-library", language_code)), CallbackAction::Library(None)),
            button(format!("💬 {}", t_lang("menu-chat", language_code)), CallbackAction::ChatWithTutor),
        ],
    ];

    if has_siblings {
        rows.push(back_row(CallbackAction::SelectChild, language_code));
    }

    Screen::new(text, rows)
}
