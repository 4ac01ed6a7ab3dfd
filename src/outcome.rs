//! Publish outcome types shared by the adapters and the orchestrator.
//!
//! Both adapters return an explicit three-way outcome instead of a bare
//! `Option`/`bool`, so "the call did not signal failure" can never be
//! mistaken for success.

/// Result of one publish adapter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The post reached the target.
    Success,
    /// The target was skipped or rejected the post for an expected reason
    /// (missing configuration, insufficient permissions).
    SoftFailure(String),
    /// An unexpected error: transport failure, timeout, malformed response.
    Exception(String),
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Success)
    }
}

/// Combined result of a dual-target publish, shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishSummary {
    Both,
    ChannelOnly,
    WallOnly,
    Neither,
}

impl PublishSummary {
    pub fn classify(channel: &PublishOutcome, wall: &PublishOutcome) -> Self {
        match (channel.is_success(), wall.is_success()) {
            (true, true) => PublishSummary::Both,
            (true, false) => PublishSummary::ChannelOnly,
            (false, true) => PublishSummary::WallOnly,
            (false, false) => PublishSummary::Neither,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            PublishSummary::Both => "✅ Пост успешно опубликован в Telegram и VK!",
            PublishSummary::ChannelOnly => {
                "✅ Пост опубликован в Telegram.\n⚠️ Не удалось опубликовать в VK (админ уведомлен)."
            }
            PublishSummary::WallOnly => {
                "✅ Пост опубликован в VK.\n⚠️ Не удалось опубликовать в Telegram."
            }
            PublishSummary::Neither => "❌ Не удалось опубликовать пост ни в Telegram, ни в VK.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_failure_and_exception_both_count_as_failure() {
        let soft = PublishOutcome::SoftFailure("not configured".to_string());
        let hard = PublishOutcome::Exception("timeout".to_string());
        assert!(!soft.is_success());
        assert!(!hard.is_success());

        assert_eq!(
            PublishSummary::classify(&PublishOutcome::Success, &soft),
            PublishSummary::ChannelOnly
        );
        assert_eq!(
            PublishSummary::classify(&PublishOutcome::Success, &hard),
            PublishSummary::ChannelOnly
        );
    }

    #[test]
    fn every_summary_has_a_distinct_message() {
        let summaries = [
            PublishSummary::Both,
            PublishSummary::ChannelOnly,
            PublishSummary::WallOnly,
            PublishSummary::Neither,
        ];
        for (i, a) in summaries.iter().enumerate() {
            for b in summaries.iter().skip(i + 1) {
                assert_ne!(a.user_message(), b.user_message());
            }
        }
    }
}
