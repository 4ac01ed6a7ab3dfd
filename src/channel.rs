//! Telegram channel publish adapter.

use std::future::IntoFuture;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, InputMedia, InputMediaPhoto, Recipient};
use tokio::time::timeout;
use tracing::{error, info};

use crate::outcome::PublishOutcome;
use crate::textutil::truncate_chars;

/// Telegram cuts media captions at this many characters.
pub const CAPTION_LIMIT: usize = 1024;
const SEND_TIMEOUT: Duration = Duration::from_secs(15);

pub struct ChannelPublisher {
    channel: Option<Recipient>,
}

impl ChannelPublisher {
    pub fn new(channel: Option<Recipient>) -> Self {
        Self { channel }
    }

    /// Send the post to the channel: text only, or one media group with the
    /// text as the caption of the first photo. Single-shot, bounded by a hard
    /// timeout; an unset channel id is a configuration error, not a crash.
    pub async fn publish(&self, bot: &Bot, text: &str, photos: &[FileId]) -> PublishOutcome {
        let Some(channel) = self.channel.clone() else {
            error!("TELEGRAM_CHANNEL_ID is not configured, skipping channel publication");
            return PublishOutcome::SoftFailure("канал не настроен".to_string());
        };

        let send = async {
            if photos.is_empty() {
                bot.send_message(channel, text.to_string())
                    .into_future()
                    .await
                    .map(|_| ())
            } else {
                let media = media_group_with_caption(text, photos);
                bot.send_media_group(channel, media)
                    .into_future()
                    .await
                    .map(|_| ())
            }
        };

        match timeout(SEND_TIMEOUT, send).await {
            Ok(Ok(())) => {
                info!(photos = photos.len(), "post sent to the Telegram channel");
                PublishOutcome::Success
            }
            Ok(Err(e)) => {
                error!(error = %e, "failed to send the post to the Telegram channel");
                PublishOutcome::Exception(e.to_string())
            }
            Err(_) => {
                error!("timed out sending the post to the Telegram channel");
                PublishOutcome::Exception("таймаут отправки в Telegram".to_string())
            }
        }
    }
}

/// Build a media group carrying the post text as the first photo's caption.
pub fn media_group_with_caption(text: &str, photos: &[FileId]) -> Vec<InputMedia> {
    photos
        .iter()
        .enumerate()
        .map(|(index, file_id)| {
            let mut photo = InputMediaPhoto::new(InputFile::file_id(file_id.clone()));
            if index == 0 {
                photo = photo.caption(truncate_chars(text, CAPTION_LIMIT));
            }
            InputMedia::Photo(photo)
        })
        .collect()
}
