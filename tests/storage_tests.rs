use bytes::Bytes;

use family_dictionary::storage::models::{
    ExpressionUpdate, Media, MediaSlot, NewExpression, NewWord, Patch, WordUpdate,
};
use family_dictionary::storage::{EntryStore, LocalStore};

fn test_store() -> (tempfile::TempDir, LocalStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path().join("data")).unwrap();
    (dir, store)
}

fn png(data: &'static [u8]) -> Media {
    Media::new("image/png", Bytes::from_static(data))
}

fn mp3(data: &'static [u8]) -> Media {
    Media::new("audio/mpeg", Bytes::from_static(data))
}

fn sample_word(term: &str) -> NewWord {
    NewWord {
        term: term.to_string(),
        definition: format!("definition of {term}"),
        examples: None,
        created_by: "Ana".to_string(),
        image: None,
        audio: None,
    }
}

fn text_update(term: &str, definition: &str) -> WordUpdate {
    WordUpdate {
        term: term.to_string(),
        definition: definition.to_string(),
        examples: None,
        image: Patch::Absent,
        audio: Patch::Absent,
    }
}

fn sample_expression(text: &str) -> NewExpression {
    NewExpression {
        expression: text.to_string(),
        meaning: format!("meaning of {text}"),
        examples: Some("example".to_string()),
        created_by: "Ion".to_string(),
        audio: None,
    }
}

#[tokio::test]
async fn test_insert_and_get_word() {
    let (_dir, store) = test_store();

    let mut new = sample_word("Cat");
    new.image = Some(png(b"\x89PNGcat"));
    let created = store.insert_word(new).await.unwrap();
    assert_eq!(created.id, 1);
    assert!(created.has_image);
    assert!(!created.has_audio);

    let fetched = store.get_word(created.id).await.unwrap().expect("word should exist");
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_get_word_not_found() {
    let (_dir, store) = test_store();
    assert!(store.get_word(1).await.unwrap().is_none());
    assert!(store.get_word(-1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_ids_are_sequential_per_kind() {
    let (_dir, store) = test_store();

    let a = store.insert_word(sample_word("a")).await.unwrap();
    let b = store.insert_word(sample_word("b")).await.unwrap();
    let e = store
        .insert_expression(sample_expression("x"))
        .await
        .unwrap();
    assert_eq!((a.id, b.id, e.id), (1, 2, 1));
}

#[tokio::test]
async fn test_list_words_sorted_by_term() {
    let (_dir, store) = test_store();
    for term in ["pear", "Apple", "banana"] {
        store.insert_word(sample_word(term)).await.unwrap();
    }

    let terms: Vec<String> = store
        .list_words()
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.term)
        .collect();
    assert_eq!(terms, vec!["Apple", "banana", "pear"]);
}

#[tokio::test]
async fn test_find_word_by_term_prefers_newest() {
    let (_dir, store) = test_store();
    store.insert_word(sample_word("dog")).await.unwrap();
    let newer = store.insert_word(sample_word("Dog")).await.unwrap();

    let found = store.find_word_by_term("DOG").await.unwrap().unwrap();
    assert_eq!(found.id, newer.id);
    assert!(store.find_word_by_term("do").await.unwrap().is_none());
}

#[tokio::test]
async fn test_word_media_slots() {
    let (_dir, store) = test_store();
    let mut new = sample_word("Cat");
    new.audio = Some(mp3(b"ID3meow"));
    let word = store.insert_word(new).await.unwrap();

    let audio = store
        .word_media(word.id, MediaSlot::Audio)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(audio.mime, "audio/mpeg");
    assert_eq!(audio.data.as_ref(), b"ID3meow");

    assert!(store
        .word_media(word.id, MediaSlot::Image)
        .await
        .unwrap()
        .is_none());
    assert!(store.word_media(99, MediaSlot::Audio).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_word_patches_each_slot_independently() {
    let (_dir, store) = test_store();
    let mut new = sample_word("Cat");
    new.image = Some(png(b"old-image"));
    new.audio = Some(mp3(b"old-audio"));
    let word = store.insert_word(new).await.unwrap();

    let mut update = text_update("Cat", "a small feline");
    update.image = Patch::Value(png(b"new-image"));
    update.audio = Patch::Absent;
    let updated = store.update_word(word.id, update).await.unwrap().unwrap();
    assert_eq!(updated.definition, "a small feline");
    assert!(updated.has_image && updated.has_audio);
    assert_eq!(updated.created_at, word.created_at);
    assert_eq!(updated.created_by, "Ana");

    let image = store
        .word_media(word.id, MediaSlot::Image)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(image.data.as_ref(), b"new-image");
    let audio = store
        .word_media(word.id, MediaSlot::Audio)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(audio.data.as_ref(), b"old-audio");

    let mut update = text_update("Cat", "a small feline");
    update.audio = Patch::Null;
    let updated = store.update_word(word.id, update).await.unwrap().unwrap();
    assert!(updated.has_image);
    assert!(!updated.has_audio);
    assert!(store
        .word_media(word.id, MediaSlot::Audio)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_update_word_not_found() {
    let (_dir, store) = test_store();
    let result = store
        .update_word(7, text_update("Cat", "feline"))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_expression_crud() {
    let (_dir, store) = test_store();
    let mut new = sample_expression("break a leg");
    new.audio = Some(mp3(b"ID3leg"));
    let created = store.insert_expression(new).await.unwrap();
    assert!(created.has_audio);

    let update = ExpressionUpdate {
        expression: "break a leg".to_string(),
        meaning: "good luck".to_string(),
        examples: None,
        audio: Patch::Null,
    };
    let updated = store
        .update_expression(created.id, update)
        .await
        .unwrap()
        .unwrap();
    assert!(!updated.has_audio);
    assert_eq!(updated.examples, None);
    assert!(store
        .expression_audio(created.id)
        .await
        .unwrap()
        .is_none());

    store
        .insert_expression(sample_expression("a piece of cake"))
        .await
        .unwrap();
    let texts: Vec<String> = store
        .list_expressions()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.expression)
        .collect();
    assert_eq!(texts, vec!["a piece of cake", "break a leg"]);
}

#[tokio::test]
async fn test_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");

    let id = {
        let store = LocalStore::open(&data_dir).unwrap();
        let mut new = sample_word("Cat");
        new.image = Some(png(b"persisted"));
        store.insert_word(new).await.unwrap().id
    };

    let store = LocalStore::open(&data_dir).unwrap();
    let word = store.get_word(id).await.unwrap().unwrap();
    assert!(word.has_image);
    let next = store.insert_word(sample_word("Dog")).await.unwrap();
    assert_eq!(next.id, id + 1);
}
