//! End-to-end walks through the authoring state machine, the way the
//! handlers drive it: template path, topic path, photos, editing, reset.

use smm_bot::session::{
    InMemorySessionStore, Phase, Session, SessionStore, TransitionError, TELEGRAM_MEDIA_GROUP_LIMIT,
};
use teloxide::types::FileId;

fn photo(n: u32) -> FileId {
    FileId(format!("file-{n}"))
}

#[test]
fn template_path_from_idle_to_publishable_draft() {
    let store = InMemorySessionStore::default();
    let chat = 1001;

    // Operator taps "generate", a template is picked, generation starts
    let mut session = store.load(chat);
    session.begin_generation().unwrap();
    session.set_template("beautiful_work");
    store.save(chat, session.clone());
    assert_eq!(store.load(chat).phase, Phase::Generating);

    // A second tap while generating is refused
    let mut busy = store.load(chat);
    assert_eq!(
        busy.begin_generation(),
        Err(TransitionError::GenerationInProgress)
    );

    // The backend answers and the draft lands
    session.accept_draft("Маникюр мечты ждет вас!".to_string());
    store.save(chat, session);

    let session = store.load(chat);
    assert_eq!(session.phase, Phase::ReadyToPublish);
    assert_eq!(session.template_key.as_deref(), Some("beautiful_work"));
    assert!(session.topic.is_none());
}

#[test]
fn topic_path_remembers_the_topic_for_regeneration() {
    let mut session = Session::default();
    session.await_topic().unwrap();
    assert_eq!(session.phase, Phase::AwaitingTopic);

    let topic = session.submit_topic("Зимние дизайны ногтей").unwrap();
    assert_eq!(session.phase, Phase::Generating);
    session.accept_draft("Пост про зимние дизайны".to_string());

    // Regeneration reuses the stored topic and keeps the photos
    session.begin_photos().unwrap();
    session.add_photo(photo(1), 10).unwrap();
    session.photos_done().unwrap();
    assert_eq!(session.topic.as_deref(), Some(topic.as_str()));

    session.begin_generation().unwrap();
    session.replace_draft("Пост про зимние дизайны, вторая версия".to_string());
    assert_eq!(session.photos.len(), 1);
    assert_eq!(session.phase, Phase::ReadyToPublish);
}

#[test]
fn switching_generation_modes_clears_the_other_origin() {
    let mut session = Session::default();
    session.set_template("lifestyle");
    assert!(session.topic.is_none());

    session.submit_topic("Уход за кутикулой").unwrap();
    assert!(session.template_key.is_none());
    assert_eq!(session.topic.as_deref(), Some("Уход за кутикулой"));

    session.set_template("useful_post");
    assert!(session.topic.is_none());
}

#[test]
fn photo_collection_enforces_the_cap_and_keeps_order() {
    let mut session = Session::default();
    session.accept_draft("Пост с фото".to_string());
    session.begin_photos().unwrap();

    for n in 1..=4 {
        let count = session.add_photo(photo(n), 4).unwrap();
        assert_eq!(count, n as usize);
    }
    assert_eq!(
        session.add_photo(photo(5), 4),
        Err(TransitionError::PhotoLimitReached(4))
    );

    let order: Vec<String> = session.photos.iter().map(|p| p.0.clone()).collect();
    assert_eq!(order, vec!["file-1", "file-2", "file-3", "file-4"]);

    // The configured cap never exceeds what Telegram accepts in one group
    assert_eq!(
        Session::photo_cap(TELEGRAM_MEDIA_GROUP_LIMIT + 5),
        TELEGRAM_MEDIA_GROUP_LIMIT
    );
}

#[test]
fn editing_replaces_the_text_and_skip_leaves_it_alone() {
    let mut session = Session::default();
    session.accept_draft("Черновик".to_string());

    session.begin_editing().unwrap();
    assert_eq!(session.phase, Phase::Editing);
    session.apply_edited_text("Отредактированный пост".to_string());
    assert_eq!(session.draft_text.as_deref(), Some("Отредактированный пост"));
    assert_eq!(session.phase, Phase::ReadyToPublish);

    session.begin_editing().unwrap();
    session.skip_editing().unwrap();
    assert_eq!(session.draft_text.as_deref(), Some("Отредактированный пост"));
    assert_eq!(session.phase, Phase::ReadyToPublish);
}

#[test]
fn clearing_the_store_resets_the_whole_flow() {
    let store = InMemorySessionStore::default();
    let chat = 42;

    let mut session = store.load(chat);
    session.accept_draft("Пост".to_string());
    session.begin_photos().unwrap();
    session.add_photo(photo(1), 10).unwrap();
    store.save(chat, session);

    store.clear(chat);

    let session = store.load(chat);
    assert_eq!(session.phase, Phase::Idle);
    assert!(session.draft_text.is_none());
    assert!(session.photos.is_empty());
    assert!(session.template_key.is_none());
    assert!(session.topic.is_none());
}
