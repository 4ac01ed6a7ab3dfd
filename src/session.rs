//! Per-chat post authoring state machine and the session store.
//!
//! A session lives in memory for the duration of one authoring flow and is
//! cleared on reset or after publishing. Transitions are methods returning
//! typed rejections, so the invariants (a draft exists in every post-draft
//! phase, the photo cap is never exceeded, generation is not re-entrant) are
//! enforced in one place and testable without Telegram.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use teloxide::types::FileId;

/// Telegram refuses media groups larger than this regardless of our own cap.
pub const TELEGRAM_MEDIA_GROUP_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Generating,
    AwaitingTopic,
    AwaitingPhotos,
    Editing,
    ReadyToPublish,
}

/// Authoring state for one chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub phase: Phase,
    pub draft_text: Option<String>,
    /// Photo file ids in upload order; capped at [`Session::photo_cap`].
    pub photos: Vec<FileId>,
    /// Template used for the current draft, for "regenerate with the same one".
    pub template_key: Option<String>,
    /// Free-form topic, the alternate generation mode.
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// Generation is already running for this chat.
    GenerationInProgress,
    /// The action needs a draft which has not been generated yet.
    NoDraft,
    /// The photo cap (carried in the error) has been reached.
    PhotoLimitReached(usize),
    /// Submitted topic was empty or whitespace-only.
    EmptyTopic,
}

impl Session {
    /// Effective photo cap: the configured maximum, never above the platform
    /// media group limit.
    pub fn photo_cap(configured_max: usize) -> usize {
        configured_max.min(TELEGRAM_MEDIA_GROUP_LIMIT)
    }

    /// Guard against double-submission: generation is not re-entrant.
    pub fn begin_generation(&mut self) -> Result<(), TransitionError> {
        if self.phase == Phase::Generating {
            return Err(TransitionError::GenerationInProgress);
        }
        self.phase = Phase::Generating;
        Ok(())
    }

    /// Switch to topic input mode.
    pub fn await_topic(&mut self) -> Result<(), TransitionError> {
        if self.phase == Phase::Generating {
            return Err(TransitionError::GenerationInProgress);
        }
        self.phase = Phase::AwaitingTopic;
        Ok(())
    }

    /// Accept a topic and move to generating. Rejects blank input in place.
    pub fn submit_topic(&mut self, topic: &str) -> Result<String, TransitionError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(TransitionError::EmptyTopic);
        }
        self.topic = Some(topic.to_string());
        self.template_key = None;
        self.phase = Phase::Generating;
        Ok(topic.to_string())
    }

    /// Remember the template behind the draft being generated.
    pub fn set_template(&mut self, key: &str) {
        self.template_key = Some(key.to_string());
        self.topic = None;
    }

    /// Install a freshly generated draft. A new draft starts photo collection
    /// over.
    pub fn accept_draft(&mut self, text: String) {
        self.draft_text = Some(text);
        self.photos.clear();
        self.phase = Phase::ReadyToPublish;
    }

    /// Overwrite only the draft text, keeping collected photos (regeneration).
    pub fn replace_draft(&mut self, text: String) {
        self.draft_text = Some(text);
        self.phase = Phase::ReadyToPublish;
    }

    /// Revert the phase after a failed generation so the operator can retry.
    pub fn generation_failed(&mut self) {
        self.phase = if self.draft_text.is_some() {
            Phase::ReadyToPublish
        } else if self.topic.is_some() {
            Phase::AwaitingTopic
        } else {
            Phase::Idle
        };
    }

    /// Start collecting photos. Requires a draft so the session can never
    /// reach a post-draft phase without text.
    pub fn begin_photos(&mut self) -> Result<(), TransitionError> {
        if self.draft_text.is_none() {
            return Err(TransitionError::NoDraft);
        }
        self.phase = Phase::AwaitingPhotos;
        Ok(())
    }

    /// Append a photo if under the cap; returns the running count.
    pub fn add_photo(
        &mut self,
        photo: FileId,
        configured_max: usize,
    ) -> Result<usize, TransitionError> {
        let cap = Self::photo_cap(configured_max);
        if self.photos.len() >= cap {
            return Err(TransitionError::PhotoLimitReached(cap));
        }
        self.photos.push(photo);
        Ok(self.photos.len())
    }

    /// Finish photo collection.
    pub fn photos_done(&mut self) -> Result<(), TransitionError> {
        if self.draft_text.is_none() {
            return Err(TransitionError::NoDraft);
        }
        self.phase = Phase::ReadyToPublish;
        Ok(())
    }

    pub fn begin_editing(&mut self) -> Result<(), TransitionError> {
        if self.draft_text.is_none() {
            return Err(TransitionError::NoDraft);
        }
        self.phase = Phase::Editing;
        Ok(())
    }

    /// Replace the draft with operator-provided text.
    pub fn apply_edited_text(&mut self, text: String) {
        self.draft_text = Some(text);
        self.phase = Phase::ReadyToPublish;
    }

    pub fn skip_editing(&mut self) -> Result<(), TransitionError> {
        if self.draft_text.is_none() {
            return Err(TransitionError::NoDraft);
        }
        self.phase = Phase::ReadyToPublish;
        Ok(())
    }
}

/// Keyed session storage, one session per chat.
///
/// An abstraction over the in-memory map so a persistent backing store could
/// be substituted without touching the state machine.
pub trait SessionStore: Send + Sync {
    /// Current session for the chat, or a fresh one if none exists.
    fn load(&self, chat_id: i64) -> Session;
    fn save(&self, chat_id: i64, session: Session);
    fn clear(&self, chat_id: i64);
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<i64, Session>>,
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, chat_id: i64) -> Session {
        self.sessions
            .lock()
            .unwrap()
            .get(&chat_id)
            .cloned()
            .unwrap_or_default()
    }

    fn save(&self, chat_id: i64, session: Session) {
        self.sessions.lock().unwrap().insert(chat_id, session);
    }

    fn clear(&self, chat_id: i64) {
        self.sessions.lock().unwrap().remove(&chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(n: u32) -> FileId {
        FileId(format!("photo-{n}"))
    }

    #[test]
    fn fresh_session_is_idle_and_empty() {
        let session = Session::default();
        assert_eq!(session.phase, Phase::Idle);
        assert!(session.draft_text.is_none());
        assert!(session.photos.is_empty());
    }

    #[test]
    fn generation_is_not_reentrant() {
        let mut session = Session::default();
        assert!(session.begin_generation().is_ok());
        assert_eq!(
            session.begin_generation(),
            Err(TransitionError::GenerationInProgress)
        );
        assert_eq!(session.phase, Phase::Generating);
    }

    #[test]
    fn new_draft_drops_photos_but_regeneration_keeps_them() {
        let mut session = Session::default();
        session.begin_generation().unwrap();
        session.accept_draft("первый пост".to_string());
        session.begin_photos().unwrap();
        session.add_photo(photo(1), 10).unwrap();
        session.add_photo(photo(2), 10).unwrap();

        session.replace_draft("перегенерированный пост".to_string());
        assert_eq!(session.photos.len(), 2);

        session.accept_draft("совсем новый пост".to_string());
        assert!(session.photos.is_empty());
    }

    #[test]
    fn photo_cap_honors_configured_and_platform_limits() {
        assert_eq!(Session::photo_cap(3), 3);
        assert_eq!(Session::photo_cap(25), TELEGRAM_MEDIA_GROUP_LIMIT);

        let mut session = Session::default();
        session.accept_draft("пост".to_string());
        session.begin_photos().unwrap();
        for n in 0..3 {
            session.add_photo(photo(n), 3).unwrap();
        }
        assert_eq!(
            session.add_photo(photo(99), 3),
            Err(TransitionError::PhotoLimitReached(3))
        );
        assert_eq!(session.photos.len(), 3);
    }

    #[test]
    fn post_draft_phases_require_a_draft() {
        let mut session = Session::default();
        assert_eq!(session.begin_photos(), Err(TransitionError::NoDraft));
        assert_eq!(session.photos_done(), Err(TransitionError::NoDraft));
        assert_eq!(session.begin_editing(), Err(TransitionError::NoDraft));
        assert_eq!(session.skip_editing(), Err(TransitionError::NoDraft));
        assert_eq!(session.phase, Phase::Idle);
    }

    #[test]
    fn blank_topic_is_rejected_in_place() {
        let mut session = Session::default();
        session.await_topic().unwrap();
        assert_eq!(session.submit_topic("   "), Err(TransitionError::EmptyTopic));
        assert_eq!(session.phase, Phase::AwaitingTopic);
        assert!(session.topic.is_none());
    }

    #[test]
    fn topic_submission_trims_and_starts_generation() {
        let mut session = Session::default();
        session.await_topic().unwrap();
        let topic = session.submit_topic("  Педикюр для новичков  ").unwrap();
        assert_eq!(topic, "Педикюр для новичков");
        assert_eq!(session.phase, Phase::Generating);
        assert!(session.template_key.is_none());
    }

    #[test]
    fn failed_generation_reverts_to_a_retryable_phase() {
        // Topic mode without a draft goes back to topic input
        let mut session = Session::default();
        session.await_topic().unwrap();
        session.submit_topic("Уход за ногтями").unwrap();
        session.generation_failed();
        assert_eq!(session.phase, Phase::AwaitingTopic);

        // Template mode without a draft goes back to idle
        let mut session = Session::default();
        session.set_template("beautiful_work");
        session.begin_generation().unwrap();
        session.generation_failed();
        assert_eq!(session.phase, Phase::Idle);

        // A failed regeneration keeps the existing draft usable
        let mut session = Session::default();
        session.accept_draft("старый пост".to_string());
        session.begin_generation().unwrap();
        session.generation_failed();
        assert_eq!(session.phase, Phase::ReadyToPublish);
        assert_eq!(session.draft_text.as_deref(), Some("старый пост"));
    }

    #[test]
    fn store_round_trips_and_clears() {
        let store = InMemorySessionStore::default();
        assert_eq!(store.load(7).phase, Phase::Idle);

        let mut session = Session::default();
        session.accept_draft("пост".to_string());
        store.save(7, session);
        assert_eq!(store.load(7).phase, Phase::ReadyToPublish);

        // Sessions are chat-scoped
        assert_eq!(store.load(8).phase, Phase::Idle);

        store.clear(7);
        assert_eq!(store.load(7).phase, Phase::Idle);
    }
}
