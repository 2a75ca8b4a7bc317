#![allow(dead_code)]

use stickyboard::model::{NewNote, NoteId, NotePatch, Point};
use stickyboard::storage::NoteStore;

/// Three notes: a bare one, one with text, one with text and a position.
pub async fn seeded_board(store: &NoteStore) -> Vec<NoteId> {
    let plain = store
        .create(NewNote::new("#fff740", ""))
        .await
        .expect("create plain note");
    let todo = store
        .create(NewNote::new("#ff7eb9", "buy milk"))
        .await
        .expect("create text note");
    let placed = store
        .create(NewNote::new("#7afcff", "standup at 10"))
        .await
        .expect("create placed note");
    store
        .update(placed, NotePatch::position(Point::new(120.0, 45.0)))
        .await
        .expect("position note");
    vec![plain, todo, placed]
}
