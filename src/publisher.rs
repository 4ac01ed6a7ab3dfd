//! Dual-target publish orchestration.
//!
//! Runs the channel and wall adapters concurrently under a global admission
//! gate, classifies the pair of outcomes into one operator-facing summary,
//! and reports a wall-only failure to the admin out of band.

use std::sync::LazyLock;

use teloxide::prelude::*;
use teloxide::types::FileId;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::channel::ChannelPublisher;
use crate::outcome::{PublishOutcome, PublishSummary};
use crate::session::Session;
use crate::textutil::truncate_with_marker;
use crate::vk::WallPublisher;

/// Safety margin under both platforms' hard text limits.
pub const PUBLISH_TEXT_LIMIT: usize = 3000;

// Caps simultaneous publish workflows across all chats.
static PUBLISH_GATE: LazyLock<Semaphore> = LazyLock::new(|| Semaphore::new(2));

pub struct DualPublisher {
    channel: ChannelPublisher,
    wall: WallPublisher,
    admin_id: ChatId,
    max_photos: usize,
}

impl DualPublisher {
    pub fn new(
        channel: ChannelPublisher,
        wall: WallPublisher,
        admin_id: ChatId,
        max_photos: usize,
    ) -> Self {
        Self {
            channel,
            wall,
            admin_id,
            max_photos,
        }
    }

    /// Publish the draft to both targets and summarize the result.
    ///
    /// Neither adapter's failure cancels the other; both convert their own
    /// errors into outcome values.
    pub async fn publish(&self, bot: &Bot, text: &str, photos: &[FileId]) -> PublishSummary {
        let text = truncate_with_marker(text, PUBLISH_TEXT_LIMIT);
        let cap = Session::photo_cap(self.max_photos);
        let photos = &photos[..photos.len().min(cap)];

        let (channel_outcome, wall_outcome) = {
            // The gate is a static semaphore that is never closed.
            let _permit = PUBLISH_GATE
                .acquire()
                .await
                .expect("publish gate unexpectedly closed");
            tokio::join!(
                self.channel.publish(bot, &text, photos),
                self.wall.publish(bot, &text, photos),
            )
        };

        info!(
            channel = ?channel_outcome,
            wall = ?wall_outcome,
            "dual publish finished"
        );

        if channel_outcome.is_success() && !wall_outcome.is_success() {
            self.notify_admin(bot, &wall_outcome).await;
        }

        PublishSummary::classify(&channel_outcome, &wall_outcome)
    }

    /// Best-effort out-of-band failure report; its own failure is only logged
    /// and never masks the publish result.
    async fn notify_admin(&self, bot: &Bot, wall_outcome: &PublishOutcome) {
        let detail = match wall_outcome {
            PublishOutcome::SoftFailure(reason) => reason.clone(),
            PublishOutcome::Exception(message) => message.clone(),
            PublishOutcome::Success => return,
        };
        let notice =
            format!("⚠️ Пост не опубликован в VK: {detail}\n\nПост вышел только в Telegram-канале.");
        if let Err(e) = bot.send_message(self.admin_id, notice).await {
            error!(error = %e, "failed to notify the admin about the VK publish failure");
        }
    }
}
