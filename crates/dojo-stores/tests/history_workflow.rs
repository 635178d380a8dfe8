//! Processes feeding a history manager through its collector, then undo,
//! redo and persistence.

use std::cell::RefCell;
use std::rc::Rc;

use dojo_stores::{
    add, command, remove, replace, HistoryManager, Process, SerializedHistory, Store,
};
use serde_json::{json, Value};

fn add_todo() -> Process {
    Process::new(
        "addTodo",
        vec![
            command(|req| {
                let todos = req.path("todos");
                Ok(match req.get(&todos) {
                    Some(_) => vec![],
                    None => vec![add(&todos, json!([]))],
                })
            }),
            command(|req| {
                let todos = req.path("todos");
                let len = req.get(&todos).and_then(Value::as_array).map_or(0, Vec::len);
                let label = req.payload().clone();
                Ok(vec![add(
                    &req.at(&todos, len),
                    json!({"label": label, "done": false}),
                )])
            }),
        ],
    )
}

fn toggle_todo() -> Process {
    Process::new(
        "toggleTodo",
        vec![command(|req| {
            let index = req.payload().as_u64().unwrap_or_default().to_string();
            let done = req.path_with("todos", &[index.as_str(), "done"]);
            let current = req.get(&done).and_then(Value::as_bool).unwrap_or(false);
            Ok(vec![replace(&done, !current)])
        })],
    )
}

fn clear_done() -> Process {
    Process::new(
        "clearDone",
        vec![command(|req| {
            let todos = req.path("todos");
            let len = req.get(&todos).and_then(Value::as_array).map_or(0, Vec::len);
            // Highest index first so earlier removals do not shift later ones.
            Ok((0..len)
                .rev()
                .map(|i| req.at(&todos, i))
                .filter(|todo| todo.value.as_ref().and_then(|v| v["done"].as_bool()) == Some(true))
                .map(|todo| remove(&todo))
                .collect())
        })],
    )
}

fn labels(store: &Store) -> Vec<String> {
    store
        .get(&store.path("todos"))
        .and_then(Value::as_array)
        .map(|todos| {
            todos
                .iter()
                .filter_map(|t| t["label"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn todo_session_with_undo_redo() {
    let mut store = Store::new();
    let mut history = HistoryManager::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    {
        let sink = Rc::clone(&log);
        let mut collect = history.collector(move |result| sink.borrow_mut().push(result.id.clone()));
        for label in ["milk", "eggs", "bread"] {
            add_todo()
                .execute_with(&mut store, &json!(label), &mut collect)
                .unwrap();
        }
        toggle_todo()
            .execute_with(&mut store, &json!(1), &mut collect)
            .unwrap();
        clear_done()
            .execute_with(&mut store, &Value::Null, &mut collect)
            .unwrap();
    }

    assert_eq!(
        *log.borrow(),
        ["addTodo", "addTodo", "addTodo", "toggleTodo", "clearDone"]
    );
    assert_eq!(labels(&store), ["milk", "bread"]);
    assert_eq!(history.history(&store).len(), 5);

    history.undo(&mut store).unwrap();
    assert_eq!(labels(&store), ["milk", "eggs", "bread"]);
    assert_eq!(store.get(&store.path("todos/1/done")), Some(&json!(true)));

    history.undo(&mut store).unwrap();
    assert_eq!(store.get(&store.path("todos/1/done")), Some(&json!(false)));

    history.redo(&mut store).unwrap();
    history.redo(&mut store).unwrap();
    assert_eq!(labels(&store), ["milk", "bread"]);
    assert!(!history.can_redo(&store));

    while history.can_undo(&store) {
        history.undo(&mut store).unwrap();
    }
    assert_eq!(store.state().as_ref(), &json!({}));
}

#[test]
fn persisted_history_rebuilds_an_equivalent_store() {
    let mut store = Store::new();
    let mut history = HistoryManager::new();
    for label in ["a", "b"] {
        history.record(&add_todo().execute(&mut store, &json!(label)).unwrap());
    }
    history.record(&toggle_todo().execute(&mut store, &json!(0)).unwrap());
    history.undo(&mut store).unwrap();

    let text = serde_json::to_string(&history.serialize(&store)).unwrap();
    let data: SerializedHistory = serde_json::from_str(&text).unwrap();
    assert_eq!(data.history.len(), 2);
    assert_eq!(data.redo.len(), 1);

    let mut restored = Store::new();
    let mut replayed = HistoryManager::new();
    let fired = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&fired);
    restored.on_invalidate(move || *seen.borrow_mut() += 1);
    replayed.deserialize(&mut restored, data).unwrap();

    assert_eq!(restored.state(), store.state());
    assert_eq!(*fired.borrow(), 1);

    replayed.redo(&mut restored).unwrap();
    assert_eq!(
        restored.get(&restored.path("todos/0/done")),
        Some(&json!(true))
    );
    replayed.undo(&mut restored).unwrap();
    replayed.undo(&mut restored).unwrap();
    replayed.undo(&mut restored).unwrap();
    assert_eq!(restored.state().as_ref(), &json!({}));
}

#[test]
fn history_missing_redo_field_deserializes() {
    let data: SerializedHistory = serde_json::from_value(json!({
        "history": [{"id": "x", "operations": [{"op": "add", "path": "/k", "value": 1}]}]
    }))
    .unwrap();
    let mut store = Store::new();
    let mut history = HistoryManager::new();
    history.deserialize(&mut store, data).unwrap();
    assert_eq!(store.state().as_ref(), &json!({"k": 1}));
    assert!(history.can_undo(&store));
    assert!(!history.can_redo(&store));
}
