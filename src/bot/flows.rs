//! Generation and publish flows shared by the message and callback handlers.
//!
//! Flows mutate the session, talk to the generation backend or the
//! publishers, and return a [`FlowReply`] for the caller to render: the
//! message handler answers with a new message, the callback handler edits
//! the message the button came from.

use rand::seq::IteratorRandom;
use teloxide::prelude::*;
use teloxide::types::InlineKeyboardMarkup;
use tracing::{info, warn};

use super::{ui_builder, App};
use crate::prompt::{self, Season, ServiceType};
use crate::session::{Phase, SessionStore, TransitionError};

pub const MSG_BUSY: &str = "Подожди, идёт генерация поста...";
pub const MSG_NO_DRAFT: &str = "Ошибка: нет сгенерированного поста.";
pub const MSG_GENERATION_FAILED: &str = "Не удалось сгенерировать пост. Попробуйте снова.";
pub const MSG_UNKNOWN_TEMPLATE: &str = "Неизвестный тип поста. Пожалуйста, выберите снова.";

/// What a flow wants said back to the operator.
#[derive(Debug)]
pub enum FlowReply {
    Text(String),
    WithKeyboard(String, InlineKeyboardMarkup),
}

/// Generate a draft from a template: the requested one, or a random pick.
pub async fn generate_from_template(app: &App, chat_id: i64, requested: Option<&str>) -> FlowReply {
    let mut session = app.sessions.load(chat_id);
    if session.begin_generation().is_err() {
        return FlowReply::Text(MSG_BUSY.to_string());
    }

    let template_key = match requested {
        Some(key) => key.to_string(),
        // Random pick mirrors the "surprise me" button
        None => match app
            .config
            .templates
            .keys()
            .choose(&mut rand::thread_rng())
        {
            Some(key) => key.to_string(),
            None => return FlowReply::Text(MSG_UNKNOWN_TEMPLATE.to_string()),
        },
    };
    let Some(template_text) = app.config.templates.get(template_key.as_str()) else {
        // Session was not saved as Generating, so nothing to revert
        return FlowReply::Text(MSG_UNKNOWN_TEMPLATE.to_string());
    };

    session.set_template(&template_key);
    app.sessions.save(chat_id, session.clone());

    let prompt = prompt::template_prompt(template_text, &app.config.contact_block);
    let service = ServiceType::for_template(&template_key);
    match app.generator.generate(&prompt, service).await {
        Ok(text) => {
            info!(chat_id, template = %template_key, "draft generated from template");
            session.accept_draft(text.clone());
            app.sessions.save(chat_id, session);
            FlowReply::WithKeyboard(
                format!("Сгенерированный пост:\n\n{text}"),
                ui_builder::draft_keyboard(false),
            )
        }
        Err(e) => {
            warn!(chat_id, template = %template_key, error = %e, "post generation failed");
            session.generation_failed();
            app.sessions.save(chat_id, session);
            FlowReply::Text(MSG_GENERATION_FAILED.to_string())
        }
    }
}

/// Regenerate the draft with the template the current draft came from,
/// keeping the collected photos.
pub async fn regenerate(app: &App, chat_id: i64) -> FlowReply {
    let mut session = app.sessions.load(chat_id);
    let Some(template_key) = session.template_key.clone() else {
        return FlowReply::Text("Неизвестный тип поста. Пожалуйста, начните сначала.".to_string());
    };
    if session.begin_generation().is_err() {
        return FlowReply::Text(MSG_BUSY.to_string());
    }
    let Some(template_text) = app.config.templates.get(template_key.as_str()) else {
        return FlowReply::Text(MSG_UNKNOWN_TEMPLATE.to_string());
    };
    app.sessions.save(chat_id, session.clone());

    let prompt = prompt::template_prompt(template_text, &app.config.contact_block);
    let service = ServiceType::for_template(&template_key);
    match app.generator.generate(&prompt, service).await {
        Ok(text) => {
            session.replace_draft(text.clone());
            app.sessions.save(chat_id, session);
            FlowReply::WithKeyboard(
                format!("Новый пост:\n\n{text}"),
                ui_builder::draft_keyboard(false),
            )
        }
        Err(e) => {
            warn!(chat_id, template = %template_key, error = %e, "post regeneration failed");
            session.generation_failed();
            app.sessions.save(chat_id, session);
            FlowReply::Text(MSG_GENERATION_FAILED.to_string())
        }
    }
}

/// Generate (or regenerate) a draft for a free-form topic, with the current
/// season woven into the prompt.
pub async fn generate_from_topic(
    app: &App,
    chat_id: i64,
    topic: &str,
    regenerating: bool,
) -> FlowReply {
    let mut session = app.sessions.load(chat_id);
    if session.phase == Phase::Generating {
        return FlowReply::Text(MSG_BUSY.to_string());
    }
    let topic = match session.submit_topic(topic) {
        Ok(topic) => topic,
        Err(TransitionError::EmptyTopic) | Err(_) => {
            return FlowReply::Text(
                "Тема не может быть пустой. Пожалуйста, пришли тему поста еще раз.".to_string(),
            )
        }
    };
    app.sessions.save(chat_id, session.clone());

    let prompt = prompt::topic_prompt(&topic, Season::current());
    match app
        .generator
        .generate(&prompt, ServiceType::ManicurePedicure)
        .await
    {
        Ok(text) => {
            info!(chat_id, topic = %topic, "draft generated from topic");
            let header = if regenerating {
                session.replace_draft(text.clone());
                format!("Новый пост на тему '{topic}':")
            } else {
                session.accept_draft(text.clone());
                format!("Сгенерированный пост на тему '{topic}':")
            };
            app.sessions.save(chat_id, session);
            FlowReply::WithKeyboard(
                format!("{header}\n\n{text}"),
                ui_builder::draft_keyboard(true),
            )
        }
        Err(e) => {
            warn!(chat_id, topic = %topic, error = %e, "topic post generation failed");
            session.generation_failed();
            app.sessions.save(chat_id, session);
            let reply = if regenerating {
                "Не удалось сгенерировать пост на заданную тему. Попробуйте снова.".to_string()
            } else {
                "Не удалось сгенерировать пост на заданную тему. Попробуйте снова.\n\nПришли тему поста еще раз."
                    .to_string()
            };
            FlowReply::Text(reply)
        }
    }
}

/// Publish the draft to both targets. Publishing is single-shot per draft:
/// the session is cleared whatever the outcome.
pub async fn publish(bot: &Bot, app: &App, chat_id: i64) -> FlowReply {
    let session = app.sessions.load(chat_id);
    let Some(draft) = session.draft_text.clone() else {
        return FlowReply::Text(MSG_NO_DRAFT.to_string());
    };

    let summary = app.publisher.publish(bot, &draft, &session.photos).await;
    app.sessions.clear(chat_id);

    FlowReply::Text(summary.user_message().to_string())
}
