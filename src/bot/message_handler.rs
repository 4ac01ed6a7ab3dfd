//! Message Handler module for processing incoming Telegram messages
//!
//! Free text is interpreted by the current session phase: a topic while the
//! bot is waiting for one, replacement text while editing. Photos are only
//! accepted during photo collection.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::PhotoSize;
use tracing::debug;

use super::flows::{self, FlowReply};
use super::ui_builder;
use super::App;
use crate::session::{Phase, SessionStore, TransitionError};

pub async fn message_handler(bot: Bot, msg: Message, app: Arc<App>) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    if !app.is_admin(user) {
        debug!(user_id = %user.id, "ignoring message from a non-admin user");
        return Ok(());
    }
    let chat_id = msg.chat.id;

    if let Some(text) = msg.text() {
        if text.starts_with("/start") {
            bot.send_message(chat_id, "Привет! Я SMM-помощник Валерии.\nВыбери действие:")
                .reply_markup(ui_builder::start_keyboard())
                .await?;
            return Ok(());
        }
        handle_text(&bot, &app, chat_id, text).await?;
    } else if let Some(photos) = msg.photo() {
        handle_photo(&bot, &app, chat_id, photos).await?;
    }

    Ok(())
}

async fn handle_text(bot: &Bot, app: &App, chat_id: ChatId, text: &str) -> Result<()> {
    let session = app.sessions.load(chat_id.0);
    match session.phase {
        Phase::AwaitingTopic => {
            let topic = text.trim();
            if topic.is_empty() {
                bot.send_message(
                    chat_id,
                    "Тема не может быть пустой. Пожалуйста, пришли тему поста еще раз.",
                )
                .await?;
                return Ok(());
            }
            bot.send_message(chat_id, format!("Принял тему: '{topic}'. Генерирую пост..."))
                .await?;
            let reply = flows::generate_from_topic(app, chat_id.0, topic, false).await;
            send_reply(bot, chat_id, reply).await?;
        }
        Phase::Editing => {
            let mut session = session;
            session.apply_edited_text(text.to_string());
            let photo_count = session.photos.len();
            let topic_based = session.topic.is_some();
            app.sessions.save(chat_id.0, session);

            bot.send_message(
                chat_id,
                format!(
                    "Текст поста обновлен!\n\n{}",
                    ui_builder::draft_summary(text, photo_count)
                ),
            )
            .reply_markup(ui_builder::draft_keyboard(topic_based))
            .await?;
        }
        _ => {
            // Free text outside a dialogue step is not an input
            debug!(chat_id = chat_id.0, phase = ?session.phase, "ignoring free text");
        }
    }
    Ok(())
}

async fn handle_photo(bot: &Bot, app: &App, chat_id: ChatId, sizes: &[PhotoSize]) -> Result<()> {
    let mut session = app.sessions.load(chat_id.0);
    if session.phase != Phase::AwaitingPhotos {
        debug!(chat_id = chat_id.0, phase = ?session.phase, "ignoring photo outside collection");
        return Ok(());
    }

    // The last size is the highest resolution
    let Some(best) = sizes.last() else {
        bot.send_message(chat_id, "Ошибка: фото не найдено.").await?;
        return Ok(());
    };

    match session.add_photo(best.file.id.clone(), app.config.max_photos_per_post) {
        Ok(count) => {
            app.sessions.save(chat_id.0, session);
            bot.send_message(
                chat_id,
                format!(
                    "Фото добавлено. Всего фото: {count}\nМожешь добавить еще или завершить загрузку."
                ),
            )
            .reply_markup(ui_builder::photo_progress_keyboard())
            .await?;
        }
        Err(TransitionError::PhotoLimitReached(cap)) => {
            bot.send_message(chat_id, format!("Максимальное количество фото в посте: {cap}"))
                .await?;
        }
        Err(_) => {
            bot.send_message(chat_id, flows::MSG_NO_DRAFT).await?;
        }
    }
    Ok(())
}

pub(super) async fn send_reply(bot: &Bot, chat_id: ChatId, reply: FlowReply) -> Result<()> {
    match reply {
        FlowReply::Text(text) => {
            bot.send_message(chat_id, text).await?;
        }
        FlowReply::WithKeyboard(text, markup) => {
            bot.send_message(chat_id, text).reply_markup(markup).await?;
        }
    }
    Ok(())
}
