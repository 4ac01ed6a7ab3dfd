//! Bot module for the Telegram conversation front-end
//!
//! This module is split into several submodules:
//! - `message_handler`: handles the /start command, topic and edited-text
//!   input, and incoming photos
//! - `callback_handler`: decodes and dispatches inline keyboard actions
//! - `flows`: generation and publish flows shared by both handlers
//! - `ui_builder`: creates keyboards and formats draft summaries

pub mod callback_handler;
pub mod flows;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

use teloxide::types::User;

use crate::channel::ChannelPublisher;
use crate::config::Config;
use crate::generation::GenerationClient;
use crate::publisher::DualPublisher;
use crate::session::InMemorySessionStore;
use crate::vk::WallPublisher;

/// Shared handler context: configuration, session store and outbound clients.
pub struct App {
    pub config: Config,
    pub sessions: InMemorySessionStore,
    pub generator: GenerationClient,
    pub publisher: DualPublisher,
}

impl App {
    pub fn new(config: Config) -> Self {
        let generator = GenerationClient::new(
            &config.ai_base_url,
            &config.ai_model,
            config.ai_api_key.clone(),
        );
        let publisher = DualPublisher::new(
            ChannelPublisher::new(config.channel.clone()),
            WallPublisher::new(&config),
            config.admin_id,
            config.max_photos_per_post,
        );
        Self {
            config,
            sessions: InMemorySessionStore::default(),
            generator,
            publisher,
        }
    }

    /// Only the configured operator may drive the bot.
    pub fn is_admin(&self, user: &User) -> bool {
        user.id.0 as i64 == self.config.admin_id.0
    }
}
