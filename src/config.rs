//! Environment-backed configuration and the static template catalog.
//!
//! The Telegram token and admin id are mandatory at startup. VK and
//! generation credentials are optional: when absent, the corresponding
//! adapter degrades to a soft failure at call time instead of crashing the
//! bot.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::env;
use teloxide::types::{ChatId, Recipient};

const DEFAULT_AI_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_AI_MODEL: &str = "deepseek/deepseek-chat";
const DEFAULT_MAX_PHOTOS_PER_POST: usize = 10;

const DEFAULT_CONTACT_BLOCK: &str = "📍 Самара, студия на Ново-Садовой\n\
     💅 Запись в личные сообщения или по телефону\n\
     📱 +7 (900) 000-00-00";

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    /// The only user allowed to drive the bot.
    pub admin_id: ChatId,
    /// Publish target channel, numeric id or `@username`.
    pub channel: Option<Recipient>,
    pub ai_base_url: String,
    pub ai_model: String,
    pub ai_api_key: Option<String>,
    /// Token of a group administrator; a group token cannot post to the wall.
    pub vk_user_token: Option<String>,
    pub vk_group_id: Option<i64>,
    /// Human-readable group handle, resolved when no numeric id is set.
    pub vk_group_screen_name: Option<String>,
    pub max_photos_per_post: usize,
    /// Prompt text per template key.
    pub templates: HashMap<&'static str, &'static str>,
    /// Appended to every template prompt.
    pub contact_block: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let telegram_token = env::var("TELEGRAM_TOKEN").context("TELEGRAM_TOKEN must be set")?;
        let admin_id = env::var("ADMIN_ID")
            .context("ADMIN_ID must be set")?
            .parse::<i64>()
            .context("ADMIN_ID must be a numeric Telegram user id")?;

        let channel = match env_opt("TELEGRAM_CHANNEL_ID") {
            Some(raw) => Some(parse_recipient(&raw)?),
            None => None,
        };

        let vk_group_id = match env_opt("VK_GROUP_ID") {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .context("VK_GROUP_ID must be a numeric group id")?,
            ),
            None => None,
        };

        let max_photos_per_post = match env_opt("MAX_PHOTOS_PER_POST") {
            Some(raw) => raw
                .parse::<usize>()
                .context("MAX_PHOTOS_PER_POST must be a number")?,
            None => DEFAULT_MAX_PHOTOS_PER_POST,
        };

        Ok(Self {
            telegram_token,
            admin_id: ChatId(admin_id),
            channel,
            ai_base_url: env_opt("AI_BASE_URL").unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string()),
            ai_model: env_opt("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            ai_api_key: env_opt("AI_API_KEY"),
            vk_user_token: env_opt("VK_USER_TOKEN"),
            vk_group_id,
            vk_group_screen_name: env_opt("VK_GROUP_SCREEN_NAME"),
            max_photos_per_post,
            templates: post_templates(),
            contact_block: env_opt("CONTACT_BLOCK")
                .unwrap_or_else(|| DEFAULT_CONTACT_BLOCK.to_string()),
        })
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// `@username` or a numeric chat id.
fn parse_recipient(raw: &str) -> Result<Recipient> {
    if let Some(username) = raw.strip_prefix('@') {
        if username.is_empty() {
            bail!("TELEGRAM_CHANNEL_ID username is empty");
        }
        return Ok(Recipient::ChannelUsername(raw.to_string()));
    }
    let id = raw
        .parse::<i64>()
        .context("TELEGRAM_CHANNEL_ID must be a numeric chat id or @username")?;
    Ok(Recipient::Id(ChatId(id)))
}

/// Prompt catalog. Keys are referenced by the `template_<key>` callbacks and
/// stored in sessions for regeneration.
pub fn post_templates() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (
            "beautiful_work",
            "Ты — Валерия, мастер маникюра и педикюра из Самары. Напиши короткий пост о свежей \
             красивой работе: маникюр, который ты только что сделала клиентке. Опиши покрытие и \
             дизайн, передай радость от результата. Пиши живо и дружелюбно, используй 1-2 эмодзи. \
             Длина — около 300-500 символов.",
        ),
        (
            "lifestyle",
            "Ты — Валерия, мастер маникюра и педикюра из Самары. Напиши лайфстайл-пост о буднях \
             мастера: атмосфера студии, любимые моменты работы, забота о клиентках. Пиши искренне, \
             как будто делишься с подругой, используй 1-2 эмодзи. Длина — около 300-500 символов.",
        ),
        (
            "useful_post",
            "Ты — Валерия, мастер маникюра и педикюра из Самары. Напиши полезный пост с 2-3 \
             простыми советами по уходу за ногтями и кожей рук в домашних условиях. Пиши простым \
             языком без специального форматирования, используй 1-2 эмодзи. Длина — около 300-500 \
             символов.",
        ),
        (
            "pedicure_work",
            "Ты — Валерия, мастер маникюра и педикюра из Самары. Напиши пост о красивом педикюре, \
             который ты сделала сегодня: аккуратные ножки, стойкое покрытие, довольная клиентка. \
             Пиши тепло и живо, используй 1-2 эмодзи. Длина — около 300-500 символов.",
        ),
        (
            "seasonal_special",
            "Ты — Валерия, мастер маникюра и педикюра из Самары. Напиши сезонный пост о том, почему \
             именно сейчас стоит позаботиться о ножках и записаться на педикюр. Привяжи текст к \
             текущему времени года, используй 1-2 эмодзи. Длина — около 300-500 символов.",
        ),
        (
            "client_feedback",
            "Ты — Валерия, мастер маникюра и педикюра из Самары. Напиши пост на основе отзыва \
             довольной клиентки о педикюре: что её порадовало, как прошёл визит. Передай искреннюю \
             благодарность, используй 1-2 эмодзи. Длина — около 300-500 символов.",
        ),
    ])
}
