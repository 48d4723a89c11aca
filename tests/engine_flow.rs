mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use clip_ledger::engine::PinMeta;
use clip_ledger::events::CoreEvent;
use clip_ledger::model::{ClipContent, ClipId, ClipKind, MergeTagValue};
use clip_ledger::pinned::{PinRequest, PinnedUpdate};
use clip_ledger::settings::Settings;
use clip_ledger::store::{KeyValueStore, MemoryStore, SqliteStore, HISTORY_KEY, MERGE_TAGS_KEY, PINNED_KEY};
use clip_ledger::{AppError, ClipboardCore};
use common::{FailingStore, Harness};
use serde_json::json;

fn slugs_in_sync(core: &ClipboardCore) -> bool {
    let claimed: BTreeSet<String> = core
        .pinned()
        .iter()
        .filter_map(|p| p.merge_tag_slug.clone())
        .collect();
    let registered: BTreeSet<String> = core.merge_tags().slugs().map(str::to_string).collect();
    claimed == registered
}

#[test]
fn duplicate_slug_is_rejected_and_registry_keeps_one_entry() {
    let h = Harness::new();
    h.core
        .pin_item(PinRequest::new(ClipContent::text("first")).slug("a"))
        .expect("first pin");
    let err = h
        .core
        .pin_item(PinRequest::new(ClipContent::text("second")).slug("a"))
        .expect_err("second pin must fail");

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.core.merge_tags().len(), 1);
    assert_eq!(h.core.pinned().len(), 1);
    assert!(slugs_in_sync(&h.core));
}

#[test]
fn slug_format_is_enforced() {
    let h = Harness::new();
    for bad in ["Has Space", "UPPER", "dash-ed"] {
        let err = h
            .core
            .pin_item(PinRequest::new(ClipContent::text("x")).slug(bad))
            .expect_err("bad slug");
        assert!(matches!(err, AppError::Validation(_)), "{bad} should be rejected");
    }
    assert!(h.core.pinned().is_empty());

    let snapshot = h
        .core
        .pin_item(PinRequest::new(ClipContent::text("ok")).slug("valid_123"))
        .expect("valid slug");
    assert_eq!(snapshot.merge_tags.get("valid_123"), Some(&MergeTagValue::Text("ok".into())));
}

#[test]
fn update_moves_slug_and_unknown_id_is_not_found() {
    let h = Harness::new();
    let snapshot = h
        .core
        .pin_item(PinRequest::new(ClipContent::text("Hello there")).slug("greet"))
        .expect("pin");
    let id = snapshot.pinned[0].id.clone();

    let updated = h
        .core
        .update_pinned_item(
            &id,
            PinnedUpdate {
                content: Some(ClipContent::text("Hi")),
                title: Some("Greeting".into()),
                merge_tag_slug: Some(Some("hi".into())),
                ..PinnedUpdate::default()
            },
        )
        .expect("update");
    assert!(updated.merge_tags.get("greet").is_none());
    assert_eq!(updated.merge_tags.get("hi"), Some(&MergeTagValue::Text("Hi".into())));
    assert_eq!(updated.pinned[0].title, "Greeting");
    assert!(slugs_in_sync(&h.core));

    let err = h
        .core
        .update_pinned_item(&ClipId::from("missing"), PinnedUpdate::default())
        .expect_err("unknown id");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn unpin_unknown_id_leaves_registry_untouched() {
    let h = Harness::new();
    h.core
        .pin_item(PinRequest::new(ClipContent::text("keep")).slug("keep"))
        .expect("pin");
    let before = h.core.merge_tags();

    let snapshot = h.core.unpin_item(&ClipId::from("nope"));
    assert_eq!(snapshot.merge_tags, before);
    assert_eq!(snapshot.pinned.len(), 1);

    let id = snapshot.pinned[0].id.clone();
    let after = h.core.unpin_item(&id);
    assert!(after.pinned.is_empty());
    assert!(after.merge_tags.is_empty());
}

#[test]
fn pin_defaults_title_and_description() {
    let h = Harness::new();
    let snapshot = h
        .core
        .pin_item(PinRequest::new(ClipContent::text("body text")))
        .expect("pin");
    assert_eq!(snapshot.pinned[0].title, "Pinned Item");
    assert_eq!(snapshot.pinned[0].description, "body text");

    let err = h
        .core
        .pin_item(PinRequest::new(ClipContent::text("   ")))
        .expect_err("blank content");
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn pin_from_history_copies_entry() {
    let h = Harness::new();
    h.capture_texts(&["alpha", "beta"]);
    let beta = h.core.history()[0].id.clone();

    let snapshot = h
        .core
        .pin_history_item(
            &beta,
            PinMeta { title: "B".into(), merge_tag_slug: Some("b".into()), ..PinMeta::default() },
        )
        .expect("pin from history");
    assert_eq!(snapshot.pinned[0].content.as_text(), Some("beta"));
    assert_eq!(h.core.history().len(), 2);

    let err = h
        .core
        .pin_history_item(&ClipId::from("gone"), PinMeta::default())
        .expect_err("missing history id");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn pin_current_clipboard_reads_port() {
    let h = Harness::new();
    h.clipboard.set_text("from clipboard");
    let snapshot = h.core.pin_current_clipboard(PinMeta::default()).expect("pin current");
    assert_eq!(snapshot.pinned[0].content.as_text(), Some("from clipboard"));

    h.clipboard.set_image(common::tiny_image([255, 0, 0, 255]));
    let snapshot = h.core.pin_current_clipboard(PinMeta::default()).expect("pin image");
    assert_eq!(snapshot.pinned[0].kind(), ClipKind::Image);
    assert_eq!(snapshot.pinned[0].description, "");

    h.clipboard.empty();
    assert!(matches!(
        h.core.pin_current_clipboard(PinMeta::default()),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn remove_and_clear_history() {
    let h = Harness::new();
    h.capture_texts(&["one", "two", "three"]);
    h.core.pin_item(PinRequest::new(ClipContent::text("pinned")).slug("p")).expect("pin");

    let two = h.core.history()[1].id.clone();
    let remaining = h.core.remove_history_item(&two);
    assert_eq!(remaining.len(), 2);
    assert_eq!(h.core.remove_history_item(&ClipId::from("unknown")).len(), 2);
    assert_eq!(h.core.remove_history_at(99).len(), 2);
    assert_eq!(h.core.remove_history_at(0).len(), 1);
    assert_eq!(h.history_texts(), vec!["one"]);

    h.core.clear_history();
    assert!(h.core.history().is_empty());
    assert_eq!(h.core.pinned().len(), 1);
    assert_eq!(h.core.merge_tags().len(), 1);
    assert_eq!(h.store.get(HISTORY_KEY).expect("get"), Some(json!([])));
}

#[test]
fn copy_writes_entry_to_clipboard() {
    let h = Harness::new();
    h.capture_texts(&["copied"]);
    h.clipboard.set_text("other");
    let id = h.core.history()[0].id.clone();

    h.core.copy_item(&id).expect("copy");
    assert_eq!(h.clipboard.text().as_deref(), Some("copied"));
    assert!(matches!(h.core.copy_item(&ClipId::from("x")), Err(AppError::NotFound(_))));

    h.clipboard.fail_writes(true);
    let err = h.core.copy_item(&id).expect_err("port failure");
    assert!(err.is_port_error());
}

#[test]
fn copy_pinned_image_decodes_storage_encoding() {
    let h = Harness::new();
    let image = common::tiny_image([0, 128, 255, 255]);
    h.clipboard.set_image(image.clone());
    let snapshot = h.core.pin_current_clipboard(PinMeta::default()).expect("pin image");
    let id = snapshot.pinned[0].id.clone();

    h.clipboard.set_text("something else");
    h.core.copy_pinned_item(&id).expect("copy pinned");
    assert_eq!(h.clipboard.image(), Some(image));
}

#[test]
fn search_matches_text_and_image_keywords() {
    let h = Harness::new();
    h.capture_texts(&["Hello World", "goodbye"]);
    h.clipboard.set_image(common::tiny_image([1, 2, 3, 255]));
    h.core.poll_once();

    assert_eq!(h.core.search_history("WORLD").len(), 1);
    assert_eq!(h.core.search_history("pic").len(), 1);
    assert_eq!(h.core.search_history("").len(), 3);

    h.core
        .pin_item(PinRequest::new(ClipContent::text("body")).title("Signature").slug("sig"))
        .expect("pin");
    assert_eq!(h.core.search_pinned("signature").len(), 1);
    assert_eq!(h.core.search_pinned("sig").len(), 1);
    assert!(h.core.search_pinned("absent").is_empty());
}

#[test]
fn smaller_history_limit_trims_and_persists() {
    let h = Harness::new();
    h.capture_texts(&["1", "2", "3", "4", "5"]);

    let saved = h.core.save_settings(Settings { max_history_size: 3, ..Settings::default() });
    assert_eq!(saved.max_history_size, 3);
    assert_eq!(h.history_texts(), vec!["5", "4", "3"]);

    let stored = h.store.get(HISTORY_KEY).expect("get").expect("history persisted");
    assert_eq!(stored.as_array().map(Vec::len), Some(3));
    assert_eq!(h.core.settings().max_history_size, 3);
}

#[test]
fn clear_all_data_resets_everything() {
    let h = Harness::new();
    h.capture_texts(&["a"]);
    h.core.pin_item(PinRequest::new(ClipContent::text("t")).slug("t")).expect("pin");
    h.core.save_settings(Settings { max_history_size: 7, ..Settings::default() });

    h.core.clear_all_data().expect("clear all");
    assert!(h.core.history().is_empty());
    assert!(h.core.pinned().is_empty());
    assert!(h.core.merge_tags().is_empty());
    assert_eq!(h.core.settings(), Settings::default());
    assert_eq!(h.store.get(PINNED_KEY).expect("get"), None);
    assert_eq!(h.store.get(MERGE_TAGS_KEY).expect("get"), None);
}

#[test]
fn state_survives_restart_with_sqlite() {
    let dir = common::unique_temp_dir();
    let path = dir.join("clipboard.db");
    let pinned_id;
    {
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&path).expect("open db"));
        let h = Harness::with_store(store);
        h.capture_texts(&["first", "second"]);
        let snapshot = h
            .core
            .pin_item(PinRequest::new(ClipContent::text("Hello there")).slug("greet"))
            .expect("pin");
        pinned_id = snapshot.pinned[0].id.clone();
        h.core.save_settings(Settings { paste_menu_timeout_ms: 0, ..Settings::default() });
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&path).expect("reopen db"));
    let h = Harness::with_store(store);
    assert_eq!(h.history_texts(), vec!["second", "first"]);
    assert_eq!(h.core.pinned()[0].id, pinned_id);
    assert_eq!(
        h.core.merge_tags().get("greet"),
        Some(&MergeTagValue::Text("Hello there".into()))
    );
    assert_eq!(h.core.settings().paste_menu_timeout_ms, 0);

    drop(h);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn legacy_and_inconsistent_store_is_repaired_on_load() {
    let store = Arc::new(MemoryStore::new());
    store.set(HISTORY_KEY, &json!(["plain old text", "plain old text", 7])).expect("seed history");
    store
        .set(
            PINNED_KEY,
            &json!([{"id": "p1", "timestamp": 1, "type": "text", "content": "Hi", "title": "Hi",
                     "mergeTagSlug": "hi"}]),
        )
        .expect("seed pinned");
    store.set(MERGE_TAGS_KEY, &json!({"orphan": "nobody owns me"})).expect("seed tags");

    let h = Harness::with_store(store);
    assert_eq!(h.history_texts(), vec!["plain old text"]);
    assert!(slugs_in_sync(&h.core));
    assert_eq!(h.core.merge_tags().get("hi"), Some(&MergeTagValue::Text("Hi".into())));
    assert!(h.core.merge_tags().get("orphan").is_none());
}

#[test]
fn storage_failure_keeps_memory_state() {
    let h = Harness::with_store(Arc::new(FailingStore));
    h.capture_texts(&["kept"]);
    let snapshot = h
        .core
        .pin_item(PinRequest::new(ClipContent::text("still pinned")).slug("still"))
        .expect("pin succeeds in memory");

    assert_eq!(h.history_texts(), vec!["kept"]);
    assert_eq!(snapshot.pinned.len(), 1);
    assert!(slugs_in_sync(&h.core));
    assert!(matches!(h.core.clear_all_data(), Err(AppError::Storage(_))));
    assert!(h.core.history().is_empty());
}

#[test]
fn mutations_emit_events() {
    let h = Harness::new();
    let mut rx = h.core.subscribe();

    h.capture_texts(&["evt"]);
    h.core.pin_item(PinRequest::new(ClipContent::text("p"))).expect("pin");
    h.core.save_settings(Settings::default());

    assert_eq!(rx.try_recv().expect("history event"), CoreEvent::HistoryChanged);
    assert_eq!(rx.try_recv().expect("pinned event"), CoreEvent::PinnedChanged);
    assert_eq!(rx.try_recv().expect("settings event"), CoreEvent::SettingsChanged);
}
