//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::InlineKeyboardMarkup;
use tracing::{debug, warn};

use super::flows::{self, FlowReply};
use super::ui_builder;
use super::App;
use crate::actions::Action;
use crate::session::SessionStore;

/// Decode the callback payload once and dispatch on the action.
pub async fn callback_handler(bot: Bot, q: CallbackQuery, app: Arc<App>) -> Result<()> {
    // Answer early to remove the button loading state
    bot.answer_callback_query(q.id.clone()).await?;

    if !app.is_admin(&q.from) {
        debug!(user_id = %q.from.id, "ignoring callback from a non-admin user");
        return Ok(());
    }
    let Some(action) = q.data.as_deref().and_then(Action::parse) else {
        debug!(user_id = %q.from.id, data = ?q.data, "ignoring unknown callback payload");
        return Ok(());
    };

    let chat_id = match q.message.as_ref() {
        Some(message) => message.chat().id,
        None => ChatId(q.from.id.0 as i64),
    };

    match action {
        Action::GeneratePost => {
            safe_edit(&bot, &q, "💭 Генерирую случайный пост...", None).await;
            let reply = flows::generate_from_template(&app, chat_id.0, None).await;
            edit_reply(&bot, &q, reply).await;
        }
        Action::ChooseTemplate => {
            safe_edit(
                &bot,
                &q,
                "Выбери тип поста:",
                Some(ui_builder::template_keyboard()),
            )
            .await;
        }
        Action::Template(key) => {
            safe_edit(&bot, &q, "💭 Генерирую пост...", None).await;
            let reply = flows::generate_from_template(&app, chat_id.0, Some(&key)).await;
            edit_reply(&bot, &q, reply).await;
        }
        Action::GenerateTopicPost => {
            let mut session = app.sessions.load(chat_id.0);
            if session.await_topic().is_err() {
                safe_edit(&bot, &q, flows::MSG_BUSY, None).await;
            } else {
                app.sessions.save(chat_id.0, session);
                safe_edit(
                    &bot,
                    &q,
                    "Пришли мне тему, на которую нужно написать пост. Это может быть любая тема, \
                     связанная с маникюром, педикюром или уходом за ногтями.\n\n\
                     Например: 'Зимние дизайны ногтей', 'Педикюр для новичков', 'Уход за ногтями в домашних условиях'",
                    None,
                )
                .await;
            }
        }
        Action::RegeneratePost => {
            safe_edit(&bot, &q, "💭 Перегенерирую пост...", None).await;
            let reply = flows::regenerate(&app, chat_id.0).await;
            edit_reply(&bot, &q, reply).await;
        }
        Action::RegenerateTopicPost => {
            let session = app.sessions.load(chat_id.0);
            let Some(topic) = session.topic.clone() else {
                safe_edit(&bot, &q, "Не найдена тема для генерации поста.", None).await;
                return Ok(());
            };
            safe_edit(
                &bot,
                &q,
                &format!("💭 Перегенерирую пост на тему '{topic}'..."),
                None,
            )
            .await;
            let reply = flows::generate_from_topic(&app, chat_id.0, &topic, true).await;
            edit_reply(&bot, &q, reply).await;
        }
        Action::AddPhoto => {
            let mut session = app.sessions.load(chat_id.0);
            match session.begin_photos() {
                Ok(()) => {
                    app.sessions.save(chat_id.0, session);
                    safe_edit(&bot, &q, "Пришли фото для поста (можно несколько).", None).await;
                }
                Err(_) => safe_edit(&bot, &q, flows::MSG_NO_DRAFT, None).await,
            }
        }
        Action::AddMorePhotos => {
            safe_edit(&bot, &q, "Продолжай отправлять фото.", None).await;
        }
        Action::PhotosDone => {
            let mut session = app.sessions.load(chat_id.0);
            match session.photos_done() {
                Ok(()) => {
                    let draft = session.draft_text.clone().unwrap_or_default();
                    let photo_count = session.photos.len();
                    let topic_based = session.topic.is_some();
                    app.sessions.save(chat_id.0, session);
                    safe_edit(
                        &bot,
                        &q,
                        &format!(
                            "Все фото загружены!\n\n{}",
                            ui_builder::draft_summary(&draft, photo_count)
                        ),
                        Some(ui_builder::draft_keyboard(topic_based)),
                    )
                    .await;
                }
                Err(_) => safe_edit(&bot, &q, flows::MSG_NO_DRAFT, None).await,
            }
        }
        Action::EditPostText => {
            let mut session = app.sessions.load(chat_id.0);
            match session.begin_editing() {
                Ok(()) => {
                    let current = session.draft_text.clone().unwrap_or_default();
                    app.sessions.save(chat_id.0, session);
                    safe_edit(
                        &bot,
                        &q,
                        &format!(
                            "Текущий текст поста:\n\n{current}\n\nПришли новый текст поста или \
                             нажми 'Пропустить', чтобы оставить без изменений:"
                        ),
                        Some(ui_builder::skip_editing_keyboard()),
                    )
                    .await;
                }
                Err(_) => {
                    safe_edit(
                        &bot,
                        &q,
                        "Ошибка: нет сгенерированного поста для редактирования.",
                        None,
                    )
                    .await;
                }
            }
        }
        Action::SkipEditing => {
            let mut session = app.sessions.load(chat_id.0);
            match session.skip_editing() {
                Ok(()) => {
                    let draft = session.draft_text.clone().unwrap_or_default();
                    let photo_count = session.photos.len();
                    let topic_based = session.topic.is_some();
                    app.sessions.save(chat_id.0, session);
                    safe_edit(
                        &bot,
                        &q,
                        &format!(
                            "Редактирование пропущено.\n\n{}",
                            ui_builder::draft_summary(&draft, photo_count)
                        ),
                        Some(ui_builder::draft_keyboard(topic_based)),
                    )
                    .await;
                }
                Err(_) => safe_edit(&bot, &q, flows::MSG_NO_DRAFT, None).await,
            }
        }
        Action::PublishNow => {
            safe_edit(&bot, &q, "Публикую пост...", None).await;
            let reply = flows::publish(&bot, &app, chat_id.0).await;
            edit_reply(&bot, &q, reply).await;
        }
        Action::Reset => {
            app.sessions.clear(chat_id.0);
            safe_edit(
                &bot,
                &q,
                "Состояние сброшено. Выбери действие:",
                Some(ui_builder::start_keyboard()),
            )
            .await;
        }
    }

    Ok(())
}

async fn edit_reply(bot: &Bot, q: &CallbackQuery, reply: FlowReply) {
    match reply {
        FlowReply::Text(text) => safe_edit(bot, q, &text, None).await,
        FlowReply::WithKeyboard(text, markup) => safe_edit(bot, q, &text, Some(markup)).await,
    }
}

/// Edit the message the callback came from, falling back to a callback alert
/// when that message is inaccessible. Bounded retries with a short pause.
async fn safe_edit(bot: &Bot, q: &CallbackQuery, text: &str, markup: Option<InlineKeyboardMarkup>) {
    const MAX_RETRIES: u32 = 2;
    const ALERT_LIMIT: usize = 199;

    for attempt in 0..=MAX_RETRIES {
        let result = match q.message.as_ref() {
            Some(message) => {
                let mut request = bot.edit_message_text(message.chat().id, message.id(), text);
                if let Some(markup) = markup.clone() {
                    request = request.reply_markup(markup);
                }
                request.await.map(|_| ())
            }
            None => {
                let alert: String = text.chars().take(ALERT_LIMIT).collect();
                bot.answer_callback_query(q.id.clone())
                    .text(alert)
                    .show_alert(true)
                    .await
                    .map(|_| ())
            }
        };
        match result {
            Ok(()) => return,
            Err(e) if attempt == MAX_RETRIES => {
                warn!(user_id = %q.from.id, error = %e, "failed to edit message after retries");
                return;
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(500)).await,
        }
    }
}
