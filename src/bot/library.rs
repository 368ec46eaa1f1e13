//! Library of learning materials, filtered by school grade

use anyhow::Result;
use sqlx::SqlitePool;
use teloxide::types::InlineKeyboardButton;

use crate::db::{self, MAX_GRADE, MIN_GRADE};
use crate::localization::{t_args_lang, t_lang};
use crate::models::Material;

use super::callback_data::{CallbackAction, GradeFilter};
use super::ui_builder::{back_row, button, esc, list_more_note, main_menu_row, push_list_line, truncate_label, Screen};

const GRADES_PER_ROW: i64 = 6;
const MATERIALS_SHOWN: usize = 40;
const LIST_TITLE_CHARS: usize = 80;
const LIST_DESCRIPTION_CHARS: usize = 120;

fn grade_label(grade: Option<i64>, language_code: Option<&str>) -> String {
    match grade {
        Some(grade) => t_args_lang("library-grade", &[("grade", &grade.to_string())], language_code),
        None => t_lang("library-all-grades", language_code),
    }
}

fn grade_rows(selected: GradeFilter, language_code: Option<&str>) -> Vec<Vec<InlineKeyboardButton>> {
    let mark = |grade: GradeFilter, label: String| {
        if grade == selected {
            format!("• {label} •")
        } else {
            label
        }
    };

    let mut rows = vec![vec![button(
        mark(None, t_lang("library-all-grades", language_code)),
        CallbackAction::Library(None),
    )]];

    let grades: Vec<i64> = (MIN_GRADE..=MAX_GRADE).collect();
    for chunk in grades.chunks(GRADES_PER_ROW as usize) {
        rows.push(
            chunk
                .iter()
                .map(|&grade| button(mark(Some(grade), grade.to_string()), CallbackAction::Library(Some(grade))))
                .collect(),
        );
    }
    rows
}

/// Material list. Tutors also get buttons to open and add materials.
pub async fn library_screen(
    pool: &SqlitePool,
    grade: GradeFilter,
    is_tutor: bool,
    language_code: Option<&str>,
) -> Result<Screen> {
    let materials = db::list_materials(pool, grade).await?;

    let mut text = format!(
        "📖 <b>{}</b> · {}\n\n",
        t_lang("library-title", language_code),
        grade_label(grade, language_code)
    );
    let mut rows = grade_rows(grade, language_code);

    if materials.is_empty() {
        text.push_str(&t_lang("library-empty", language_code));
    }
    let mut shown = 0;
    for material in materials.iter().take(MATERIALS_SHOWN) {
        if !push_list_line(&mut text, &format_material_line(material, Some(LIST_DESCRIPTION_CHARS), language_code)) {
            break;
        }
        shown += 1;
        if is_tutor {
            rows.push(vec![button(format!("📄 {}", material.title), CallbackAction::Material(material.id))]);
        }
    }
    text.push_str(&list_more_note(materials.len() - shown, language_code));

    if is_tutor {
        rows.push(vec![button(
            format!("➕ {}", t_lang("library-add", language_code)),
            CallbackAction::AddMaterial(grade),
        )]);
    }
    rows.push(main_menu_row(language_code));

    Ok(Screen::new(text, rows))
}

/// Material with its link. `max_description` shortens the description for lists.
pub fn format_material_line(material: &Material, max_description: Option<usize>, language_code: Option<&str>) -> String {
    let title = match max_description {
        Some(_) => truncate_label(&material.title, LIST_TITLE_CHARS),
        None => material.title.clone(),
    };
    let mut line = format!(
        "• <a href=\"{}\">{}</a> ({})",
        esc(&material.link),
        esc(&title),
        grade_label(material.grade, language_code)
    );
    if let Some(description) = &material.description {
        let description = match max_description {
            Some(max) => truncate_label(description, max),
            None => description.clone(),
        };
        line.push_str(&format!("\n  {}", esc(&description)));
    }
    line
}

/// Tutor view of a single material
pub fn material_details(material: &Material, language_code: Option<&str>) -> Screen {
    let text = format!("📄 {}", format_material_line(material, None, language_code));
    let rows = vec![
        vec![button(
            format!("🗑 {}", t_lang("button-delete", language_code)),
            CallbackAction::DeleteMaterial(material.id),
        )],
        back_row(CallbackAction::Library(material.grade), language_code),
    ];
    Screen::new(text, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_rows_cover_every_grade() {
        let rows = grade_rows(Some(5), None);
        let buttons: usize = rows.iter().map(|row| row.len()).sum();
        // "All" plus grades 1..=11
        assert_eq!(buttons, 12);
        assert!(rows.iter().flatten().any(|b| b.text == "• 5 •"));
    }
}
