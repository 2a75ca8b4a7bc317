mod common;

use common::{broken_sync, scenarios, test_store, test_sync};
use std::sync::Arc;
use stickyboard::BoardError;
use stickyboard::model::{NewNote, NoteHandle, NotePatch, Point};
use stickyboard::storage::NoteStore;
use stickyboard::sync::{NoteSync, NoticeKind, parse_script};
use tempfile::TempDir;

async fn file_sync(dir: &TempDir) -> NoteSync {
    common::init_test_logging();
    let nested = dir.path().join("board");
    std::fs::create_dir_all(&nested).unwrap();
    let store = NoteStore::at_path(&nested.join("notes.db"));
    store.open().await.unwrap();
    NoteSync::new(Arc::new(store))
}

#[tokio::test]
async fn add_renders_then_binds() {
    let sync = test_sync().await;
    let handle = sync.on_add_requested("#ff7eb9").await.unwrap();

    let note = sync.note(handle).unwrap();
    assert!(note.is_interactive());
    assert_eq!(note.color, "#ff7eb9");
    let stored = sync.store().read(note.id.unwrap()).await.unwrap();
    assert_eq!(stored.color, "#ff7eb9");
    assert!(stored.position().is_none());
    assert!(sync.take_notices().is_empty());
}

#[tokio::test]
async fn failed_add_leaves_unbound_note_and_notice() {
    let dir = TempDir::new().unwrap();
    let sync = broken_sync(&dir);

    let err = sync.on_add_requested("#fff740").await.unwrap_err();
    assert!(matches!(err, BoardError::Connection { .. }));

    let notes = sync.snapshot();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].id.is_none());
    assert!(matches!(
        sync.on_text_changed(notes[0].handle, "typed anyway"),
        Err(BoardError::Unbound(_))
    ));

    let notices = sync.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::SaveFailed);
    assert_eq!(notices[0].note, Some(notes[0].handle));
}

#[tokio::test]
async fn failed_load_renders_nothing() {
    let dir = TempDir::new().unwrap();
    let sync = broken_sync(&dir);

    assert!(sync.load_all().await.is_err());
    assert!(sync.snapshot().is_empty());
    let notices = sync.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::LoadFailed);
}

#[tokio::test]
async fn load_restores_text_color_and_position() {
    let store = test_store().await;
    let ids = scenarios::seeded_board(&store).await;
    let sync = NoteSync::new(Arc::new(store));

    let handles = sync.load_all().await.unwrap();
    assert_eq!(handles.len(), ids.len());

    let notes = sync.snapshot();
    let placed = notes.iter().find(|n| n.id == Some(ids[2])).unwrap();
    assert_eq!(placed.text, "standup at 10");
    assert_eq!(placed.color, "#7afcff");
    assert_eq!(placed.offset, Some(Point::new(120.0, 45.0)));
    let plain = notes.iter().find(|n| n.id == Some(ids[0])).unwrap();
    assert_eq!(plain.offset, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn text_edits_save_in_the_order_they_were_typed() {
    let sync = test_sync().await;
    let handle = sync.on_add_requested("#fff740").await.unwrap();
    let id = sync.note(handle).unwrap().id.unwrap();
    let typed = "hello world";

    for round in 0..20 {
        let mut saves = Vec::new();
        for end in 1..=typed.len() {
            let text = format!("{round}:{}", &typed[..end]);
            saves.push(sync.on_text_changed(handle, &text).unwrap());
            assert_eq!(sync.note(handle).unwrap().text, text);
        }
        for save in saves {
            save.await.unwrap();
        }

        let expected = format!("{round}:{typed}");
        assert_eq!(sync.note(handle).unwrap().text, expected);
        assert_eq!(sync.store().read(id).await.unwrap().text, expected);
    }
    assert!(sync.take_notices().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn back_to_back_drags_save_the_last_drop() {
    let sync = test_sync().await;
    let handle = sync.on_add_requested("#fff740").await.unwrap();
    let id = sync.note(handle).unwrap().id.unwrap();

    for round in 0..20 {
        let mut saves = Vec::new();
        for step in 1..=3 {
            sync.on_drag_start(handle, Point::new(0.0, 0.0)).unwrap();
            sync.on_drag_move(Point::new(1.0, f64::from(step)));
            saves.push(sync.on_drag_end().unwrap());
        }
        for save in saves {
            save.await.unwrap();
        }

        let shown = sync.note(handle).unwrap().offset.unwrap();
        let stored = sync.store().read(id).await.unwrap();
        assert_eq!(stored.position(), Some(shown), "round {round}");
    }
}

#[tokio::test]
async fn failed_edit_keeps_display_and_raises_notice() {
    let sync = test_sync().await;
    let handle = sync.on_add_requested("#fff740").await.unwrap();
    // Reopening an in-memory store starts from an empty database, so the
    // note no longer exists when the save lands.
    sync.store().close().await;

    sync.on_text_changed(handle, "lost edit").unwrap().await.unwrap();

    assert_eq!(sync.note(handle).unwrap().text, "lost edit");
    let notices = sync.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::UpdateFailed);
}

#[tokio::test]
async fn delete_removes_note_after_store_delete() {
    let sync = test_sync().await;
    let handle = sync.on_add_requested("#fff740").await.unwrap();
    let id = sync.note(handle).unwrap().id.unwrap();

    sync.on_delete_requested(handle).await.unwrap();

    assert!(sync.note(handle).is_none());
    assert!(matches!(
        sync.store().read(id).await,
        Err(BoardError::NotFound { .. })
    ));
}

#[tokio::test]
async fn failed_delete_leaves_note_visible_and_mutable() {
    let dir = TempDir::new().unwrap();
    let sync = file_sync(&dir).await;
    let handle = sync.on_add_requested("#fff740").await.unwrap();

    sync.store().close().await;
    std::fs::remove_dir_all(dir.path().join("board")).unwrap();

    assert!(sync.on_delete_requested(handle).await.is_err());
    let note = sync.note(handle).expect("note still rendered");
    assert!(note.is_interactive());
    let notices = sync.take_notices();
    assert_eq!(notices[0].kind, NoticeKind::DeleteFailed);
    assert_eq!(notices[0].note, Some(handle));
}

#[tokio::test]
async fn drag_saves_only_the_final_position() {
    let sync = test_sync().await;
    let handle = sync.on_add_requested("#fff740").await.unwrap();
    let id = sync.note(handle).unwrap().id.unwrap();
    sync.report_layout(handle, Point::new(10.0, 20.0)).unwrap();

    sync.on_drag_start(handle, Point::new(15.0, 25.0)).unwrap();
    assert_eq!(
        sync.on_drag_move(Point::new(35.0, 25.0)),
        Some(Point::new(30.0, 20.0))
    );
    assert_eq!(
        sync.on_drag_move(Point::new(65.0, 105.0)),
        Some(Point::new(60.0, 100.0))
    );
    assert!(
        sync.store().read(id).await.unwrap().position().is_none(),
        "nothing is saved while dragging"
    );

    sync.on_drag_end().expect("save task").await.unwrap();

    assert!(sync.active_drag().is_none());
    let stored = sync.store().read(id).await.unwrap();
    assert_eq!(stored.x.as_deref(), Some("60px"));
    assert_eq!(stored.y.as_deref(), Some("100px"));
    assert_eq!(sync.note(handle).unwrap().offset, Some(Point::new(60.0, 100.0)));
}

#[tokio::test]
async fn drag_moves_are_ignored_when_idle() {
    let sync = test_sync().await;
    assert_eq!(sync.on_drag_move(Point::new(1.0, 1.0)), None);
    assert!(sync.on_drag_end().is_none());
}

#[tokio::test]
async fn second_drag_start_abandons_the_first() {
    let sync = test_sync().await;
    let first = sync.on_add_requested("#fff740").await.unwrap();
    let second = sync.on_add_requested("#ff7eb9").await.unwrap();
    let first_id = sync.note(first).unwrap().id.unwrap();

    sync.on_drag_start(first, Point::new(0.0, 0.0)).unwrap();
    sync.on_drag_move(Point::new(40.0, 40.0));
    sync.on_drag_start(second, Point::new(100.0, 100.0)).unwrap();
    sync.on_drag_move(Point::new(110.0, 90.0));
    sync.on_drag_end().unwrap().await.unwrap();

    let abandoned = sync.note(first).unwrap();
    assert_eq!(abandoned.offset, Some(Point::new(40.0, 40.0)));
    assert!(sync.store().read(first_id).await.unwrap().position().is_none());

    let moved = sync.note(second).unwrap();
    assert_eq!(moved.offset, Some(Point::new(10.0, -10.0)));
    assert!(moved.z_index > abandoned.z_index);
}

#[tokio::test]
async fn failed_drag_save_keeps_position_and_releases_drag() {
    let sync = test_sync().await;
    let handle = sync.on_add_requested("#fff740").await.unwrap();
    sync.store().close().await;

    sync.on_drag_start(handle, Point::new(0.0, 0.0)).unwrap();
    sync.on_drag_move(Point::new(5.0, 7.0));
    sync.on_drag_end().unwrap().await.unwrap();

    assert!(sync.active_drag().is_none());
    assert_eq!(sync.note(handle).unwrap().offset, Some(Point::new(5.0, 7.0)));
    assert_eq!(sync.take_notices()[0].kind, NoticeKind::UpdateFailed);
}

#[tokio::test]
async fn delete_during_drag_ends_the_drag() {
    let sync = test_sync().await;
    let handle = sync.on_add_requested("#fff740").await.unwrap();
    sync.on_drag_start(handle, Point::new(0.0, 0.0)).unwrap();

    sync.on_delete_requested(handle).await.unwrap();

    assert!(sync.active_drag().is_none());
    assert!(sync.on_drag_end().is_none());
}

#[tokio::test]
async fn scripted_session_matches_direct_calls() {
    let sync = test_sync().await;
    let script = r##"
        # two notes, edit one, move the other
        {"event": "add", "color": "#ff0000"}
        {"event": "add"}
        {"event": "text", "note": 0, "text": "hello"}
        {"event": "drag_start", "note": 1, "x": 0, "y": 0}
        {"event": "drag_move", "x": 50, "y": 80}
        {"event": "drag_end"}
    "##;

    let mut tasks = Vec::new();
    for event in parse_script(script).unwrap() {
        if let Some(task) = sync.apply(&event, "#fff740").await.unwrap() {
            tasks.push(task);
        }
    }
    for task in tasks {
        task.await.unwrap();
    }

    let notes = sync.store().read_all().await.unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].color, "#ff0000");
    assert_eq!(notes[0].text, "hello");
    assert_eq!(notes[1].color, "#fff740");
    assert_eq!(notes[1].x.as_deref(), Some("50px"));
    assert_eq!(notes[1].y.as_deref(), Some("80px"));
}

#[tokio::test]
async fn concurrent_edit_and_delete_never_resurrects() {
    let store = test_store().await;
    let id = store.create(NewNote::new("#fff740", "")).await.unwrap();
    let sync = NoteSync::new(Arc::new(store));
    sync.load_all().await.unwrap();
    let handle = NoteHandle(0);

    let save = sync.on_text_changed(handle, "pending").unwrap();
    sync.on_delete_requested(handle).await.unwrap();
    save.await.unwrap();

    assert!(matches!(
        sync.store().read(id).await,
        Err(BoardError::NotFound { .. })
    ));
    assert!(
        sync.store()
            .update(id, NotePatch::text("again"))
            .await
            .is_err()
    );
}
