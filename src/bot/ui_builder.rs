//! UI Builder module for creating keyboards and formatting draft summaries

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::actions::Action;

fn button(text: &str, action: Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.callback_data())
}

/// Unified keyboard for /start and after a reset.
pub fn start_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("🪄 Сгенерировать пост", Action::GeneratePost),
            button("📝 Написать пост на тему", Action::GenerateTopicPost),
        ],
        vec![
            button("🎨 Выбрать тип поста", Action::ChooseTemplate),
            button("📷 Добавить фото", Action::AddPhoto),
        ],
        vec![
            button("✅ Опубликовать", Action::PublishNow),
            button("🔁 Перегенерировать", Action::RegeneratePost),
        ],
        vec![button("🔄 Сброс", Action::Reset)],
    ])
}

/// Actions offered under a freshly generated or edited draft. The regenerate
/// button keeps the generation mode the draft came from.
pub fn draft_keyboard(topic_based: bool) -> InlineKeyboardMarkup {
    let regenerate = if topic_based {
        Action::RegenerateTopicPost
    } else {
        Action::RegeneratePost
    };
    InlineKeyboardMarkup::new(vec![
        vec![
            button("✅ Опубликовать", Action::PublishNow),
            button("🔁 Сгенерировать заново", regenerate),
        ],
        vec![
            button("📷 Добавить фото", Action::AddPhoto),
            button("✏️ Редактировать текст", Action::EditPostText),
        ],
    ])
}

pub fn template_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button(
                "Красивая работа",
                Action::Template("beautiful_work".to_string()),
            ),
            button("Лайфстайл", Action::Template("lifestyle".to_string())),
        ],
        vec![
            button("Полезный пост", Action::Template("useful_post".to_string())),
            button(
                "Красивый педикюр",
                Action::Template("pedicure_work".to_string()),
            ),
        ],
        vec![
            button(
                "Сезонная тема",
                Action::Template("seasonal_special".to_string()),
            ),
            button(
                "Отзыв клиента",
                Action::Template("client_feedback".to_string()),
            ),
        ],
    ])
}

/// Offered after each accepted photo.
pub fn photo_progress_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("✅ Готово, все фото загружены", Action::PhotosDone)],
        vec![button("📷 Добавить еще фото", Action::AddMorePhotos)],
    ])
}

pub fn skip_editing_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "✅ Пропустить редактирование",
        Action::SkipEditing,
    )]])
}

/// Running summary of the current draft shown between steps.
pub fn draft_summary(draft: &str, photo_count: usize) -> String {
    format!("Текст поста:\n{draft}\n\nФото: {photo_count} шт.\n\nОпубликовать или отредактировать?")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;

    fn payloads(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                    Some(data.clone())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn every_keyboard_payload_decodes_to_an_action() {
        for markup in [
            start_keyboard(),
            draft_keyboard(false),
            draft_keyboard(true),
            template_keyboard(),
            photo_progress_keyboard(),
            skip_editing_keyboard(),
        ] {
            for payload in payloads(&markup) {
                assert!(
                    Action::parse(&payload).is_some(),
                    "undecodable payload {payload}"
                );
            }
        }
    }

    #[test]
    fn regenerate_button_tracks_the_generation_mode() {
        assert!(payloads(&draft_keyboard(true)).contains(&"regenerate_post_topic".to_string()));
        assert!(payloads(&draft_keyboard(false)).contains(&"regenerate_post".to_string()));
    }
}
