// staged_flow.rs — End-to-end flows through the public API.
//
// Covers the full lifecycle of a store:
//
//   1. Open a store over a backend (memory or JSON files)
//   2. Stage edits through nested namespace handles
//   3. Observe change detection at every level
//   4. Reset, or commit and persist
//   5. Reopen from the backend and verify what survived
//
// plus backend failures, which must surface without corrupting state.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::{json, Value};
use tempfile::tempdir;

use stage_store::{Backend, JsonFileBackend, Key, MemoryBackend, Namespace, StoreError};

fn seed() -> Value {
    json!({"foo": "bar", "baz": {"a": {"x": 1}}, "array": [1, 2, 3]})
}

/// Backend that serves loads from an inner backend but can be told to fail.
struct FlakyBackend {
    inner: MemoryBackend,
    fail_saves: Cell<bool>,
    fail_loads: Cell<bool>,
}

impl FlakyBackend {
    fn new() -> Self {
        Self {
            inner: MemoryBackend::new(),
            fail_saves: Cell::new(false),
            fail_loads: Cell::new(false),
        }
    }
}

impl Backend for FlakyBackend {
    fn load(&self, id: &str) -> Result<Value, StoreError> {
        if self.fail_loads.get() {
            return Err(StoreError::BackendError("load refused".into()));
        }
        self.inner.load(id)
    }

    fn save(&self, id: &str, tree: &Value) -> Result<(), StoreError> {
        if self.fail_saves.get() {
            return Err(StoreError::BackendError("disk full".into()));
        }
        self.inner.save(id, tree)
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

#[test]
fn nested_namespace_edit_then_reset() {
    let store = Namespace::with_data("doc", seed(), MemoryBackend::new()).unwrap();

    store.ns("baz").ns("a").set("x", 99).unwrap();
    assert_eq!(store.get("baz").unwrap().unwrap()["a"]["x"], json!(99));
    assert!(store.changed().unwrap());
    assert!(store.ns("baz").changed().unwrap());

    store.reset().unwrap();
    assert_eq!(store.ns("baz").ns("a").get("x").unwrap(), Some(json!(1)));
    assert!(!store.changed().unwrap());
}

#[test]
fn array_namespace_grows() {
    let store = Namespace::with_data("doc", seed(), MemoryBackend::new()).unwrap();
    let array = store.ns("array");

    assert_eq!(
        array.keys().unwrap(),
        vec![Key::Index(0), Key::Index(1), Key::Index(2)]
    );
    array.set(3usize, 4).unwrap();
    assert_eq!(array.get(3usize).unwrap(), Some(json!(4)));
    assert_eq!(
        array.keys().unwrap(),
        vec![Key::Index(0), Key::Index(1), Key::Index(2), Key::Index(3)]
    );
}

#[test]
fn map_in_place_matches_returned_data() {
    let store = Namespace::with_data(
        "doc",
        json!({"prices": {"a": 1, "b": 2}}),
        MemoryBackend::new(),
    )
    .unwrap();

    let handle = store
        .ns("prices")
        .map_in_place(|v, _| json!(v.as_i64().unwrap_or(0) * 100))
        .unwrap();

    assert_eq!(handle.data().unwrap(), json!({"a": 100, "b": 200}));
    assert_eq!(store.ns("prices").data().unwrap(), handle.data().unwrap());
}

#[test]
fn commit_round_trip_through_shared_memory_backend() {
    let backend = Rc::new(MemoryBackend::new());

    let store = Namespace::with_data("doc", seed(), Rc::clone(&backend)).unwrap();
    store.ns("baz").ns("a").set("y", "new").unwrap();
    store.unset("foo").unwrap();
    store.commit(true).unwrap();
    assert!(!store.changed().unwrap());

    let reopened = Namespace::open("doc", Rc::clone(&backend)).unwrap();
    assert_eq!(reopened.keys().unwrap(), store.keys().unwrap());
    assert_eq!(reopened.data().unwrap(), store.data().unwrap());
    assert_eq!(
        reopened.ns("baz").ns("a").get("y").unwrap(),
        Some(json!("new"))
    );
}

#[test]
fn namespace_commit_persists_whole_tree() {
    let backend = Rc::new(MemoryBackend::new());
    let store = Namespace::with_data("doc", seed(), Rc::clone(&backend)).unwrap();

    store.set("foo", "staged-only").unwrap();
    store.ns("baz").set("b", 2).unwrap();
    store.ns("baz").commit(true).unwrap();

    let saved = backend.load("doc").unwrap();
    assert_eq!(saved["baz"]["b"], json!(2));
    // The root's staged edit was not committed, so it was not saved.
    assert_eq!(saved["foo"], json!("bar"));
    assert!(saved.get("array").is_some());
}

#[test]
fn commit_round_trip_through_json_files() {
    let dir = tempdir().unwrap();

    {
        let store = Namespace::open("settings", JsonFileBackend::new(dir.path()).unwrap()).unwrap();
        assert_eq!(store.data().unwrap(), json!({}));
        store.set("theme", "dark").unwrap();
        store.set("recent", json!(["a.txt", "b.txt"])).unwrap();
        store.commit(true).unwrap();
    }

    let store = Namespace::open("settings", JsonFileBackend::new(dir.path()).unwrap()).unwrap();
    assert_eq!(store.get("theme").unwrap(), Some(json!("dark")));
    assert_eq!(
        store.ns("recent").keys().unwrap(),
        vec![Key::Index(0), Key::Index(1)]
    );
    assert!(!store.changed().unwrap());
}

#[test]
fn commit_without_save_does_not_persist() {
    let backend = Rc::new(MemoryBackend::new());
    let store = Namespace::with_data("doc", seed(), Rc::clone(&backend)).unwrap();
    store.set("foo", "x").unwrap();
    store.commit(false).unwrap();
    assert!(backend.raw("doc").is_none());
    assert_eq!(store.committed_data().unwrap()["foo"], json!("x"));
}

#[test]
fn failed_save_keeps_committed_tree_and_staged_edits() {
    let backend = Rc::new(FlakyBackend::new());
    let store = Namespace::with_data("doc", seed(), Rc::clone(&backend)).unwrap();

    store.ns("baz").ns("a").set("x", 42).unwrap();
    backend.fail_saves.set(true);

    let err = store.commit(true).unwrap_err();
    assert!(matches!(err, StoreError::BackendError(_)));
    assert_eq!(store.committed_data().unwrap(), seed());
    assert!(store.changed().unwrap());
    assert_eq!(store.ns("baz").ns("a").get("x").unwrap(), Some(json!(42)));

    backend.fail_saves.set(false);
    store.commit(true).unwrap();
    assert_eq!(backend.load("doc").unwrap()["baz"]["a"]["x"], json!(42));
}

#[test]
fn failed_save_of_padded_list_slot_restores_committed_list() {
    let backend = Rc::new(FlakyBackend::new());
    let store =
        Namespace::with_data("doc", json!({"list": [1]}), Rc::clone(&backend)).unwrap();

    let list = store.ns("list");
    list.set(3usize, json!({"a": 1})).unwrap();
    backend.fail_saves.set(true);

    let err = list.ns(3usize).commit(true).unwrap_err();
    assert!(matches!(err, StoreError::BackendError(_)));
    assert_eq!(store.committed_data().unwrap(), json!({"list": [1]}));
    assert_eq!(list.get(3usize).unwrap(), Some(json!({"a": 1})));
    assert!(backend.inner.is_empty());
}

#[test]
fn failed_save_of_unset_namespace_restores_it() {
    let backend = Rc::new(FlakyBackend::new());
    let store = Namespace::with_data("doc", seed(), Rc::clone(&backend)).unwrap();

    store.unset("baz").unwrap();
    backend.fail_saves.set(true);

    assert!(store.ns("baz").commit(true).is_err());
    assert_eq!(store.committed_data().unwrap(), seed());
    assert!(!store.has("baz").unwrap());
}

#[test]
fn unreadable_data_dir_is_not_masked_as_empty() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    let backend = JsonFileBackend::new(&data).unwrap();

    std::fs::remove_dir(&data).unwrap();
    std::fs::write(&data, "not a directory").unwrap();

    assert!(matches!(
        Namespace::open("doc", backend),
        Err(StoreError::IoError { .. })
    ));
}

#[test]
fn failed_load_is_not_masked() {
    let backend = FlakyBackend::new();
    backend.fail_loads.set(true);
    let result = Namespace::open("doc", backend);
    assert!(matches!(result, Err(StoreError::BackendError(_))));
}

#[test]
fn corrupt_snapshot_surfaces_on_open() {
    let backend = MemoryBackend::new();
    backend.insert_raw("doc", "{\"truncated\": ");
    assert!(matches!(
        Namespace::open("doc", backend),
        Err(StoreError::SerializationError(_))
    ));
}

#[test]
fn handles_observe_each_others_resets_and_commits() {
    let store = Namespace::with_data("doc", seed(), MemoryBackend::new()).unwrap();
    let writer = store.ns("baz").ns("a");
    let reader = store.root().ns("baz").ns("a");

    writer.set("x", 7).unwrap();
    assert_eq!(reader.get("x").unwrap(), Some(json!(7)));

    store.reset().unwrap();
    assert_eq!(reader.get("x").unwrap(), Some(json!(1)));

    writer.set("x", 8).unwrap();
    store.commit(false).unwrap();
    assert_eq!(reader.get("x").unwrap(), Some(json!(8)));
    assert!(!reader.changed().unwrap());
}
