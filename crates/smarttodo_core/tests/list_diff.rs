use smarttodo_core::{diff_tasks, ChangePayload, DiffOp, Priority, Task, TaskDiffCallback};

fn stored(id: i64, title: &str) -> Task {
    let mut task = Task::with_created_at(title, id);
    task.id = Some(id);
    task
}

fn ids(tasks: &[Task]) -> Vec<Option<i64>> {
    tasks.iter().map(|task| task.id).collect()
}

#[test]
fn same_item_is_decided_by_id_alone() {
    let callback = TaskDiffCallback;
    let a = stored(1, "a");
    let mut renamed = a.clone();
    renamed.title = "renamed".to_string();

    assert!(callback.are_items_the_same(&a, &renamed));
    assert!(!callback.are_items_the_same(&a, &stored(2, "a")));
}

#[test]
fn each_displayed_field_breaks_content_equality() {
    let callback = TaskDiffCallback;
    let base = stored(1, "a");
    assert!(callback.are_contents_the_same(&base, &base.clone()));

    let mut title = base.clone();
    title.title = "b".to_string();
    let mut description = base.clone();
    description.description = Some("details".to_string());
    let mut priority = base.clone();
    priority.priority = Priority::High;
    let mut due = base.clone();
    due.due_at = Some(10);
    let mut completed = base.clone();
    completed.is_completed = true;

    for variant in [&title, &description, &priority, &due, &completed] {
        assert!(!callback.are_contents_the_same(&base, variant));
    }
    assert_eq!(
        callback.change_payload(&base, &completed),
        Some(ChangePayload::Completion)
    );
    assert_eq!(
        callback.change_payload(&base, &title),
        Some(ChangePayload::Full)
    );
    assert_eq!(callback.change_payload(&base, &base), None);
}

#[test]
fn reorder_and_toggle_produce_one_move_and_completion_change() {
    let a = stored(1, "A");
    let b = stored(2, "B");
    let old = vec![a.clone(), b.clone()];
    let mut b_done = b.clone();
    b_done.is_completed = true;
    let new = vec![b_done, a];

    let diff = diff_tasks(&old, &new);

    let moves = diff
        .ops
        .iter()
        .filter(|op| matches!(op, DiffOp::Move { .. }))
        .count();
    assert_eq!(moves, 1);
    assert!(diff.ops.contains(&DiffOp::Change {
        index: 0,
        payload: ChangePayload::Completion
    }));
    assert!(!diff
        .ops
        .iter()
        .any(|op| matches!(op, DiffOp::Insert { .. } | DiffOp::Remove { .. })));
    assert_eq!(diff.apply(&old, &new), Some(new.clone()));
}

#[test]
fn mixed_edits_replay_to_the_new_list() {
    let old: Vec<Task> = (1..=6).map(|id| stored(id, &format!("t{id}"))).collect();
    let mut changed = stored(4, "t4 edited");
    changed.priority = Priority::Low;
    let new = vec![
        stored(5, "t5"),
        stored(1, "t1"),
        stored(7, "t7"),
        stored(3, "t3"),
        changed,
        stored(8, "t8"),
    ];

    let diff = diff_tasks(&old, &new);

    let removes: Vec<usize> = diff
        .ops
        .iter()
        .filter_map(|op| match op {
            DiffOp::Remove { index } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(removes, vec![5, 1]);
    let moves = diff
        .ops
        .iter()
        .filter(|op| matches!(op, DiffOp::Move { .. }))
        .count();
    assert_eq!(moves, 1, "only t5 is out of order");
    assert_eq!(ids(&diff.apply(&old, &new).unwrap()), ids(&new));
    assert_eq!(diff.apply(&old, &new), Some(new.clone()));
}

#[test]
fn empty_transitions_are_pure_inserts_or_removes() {
    let tasks = vec![stored(1, "a"), stored(2, "b")];

    let fill = diff_tasks(&[], &tasks);
    assert_eq!(
        fill.ops,
        vec![DiffOp::Insert { index: 0 }, DiffOp::Insert { index: 1 }]
    );

    let clear = diff_tasks(&tasks, &[]);
    assert_eq!(
        clear.ops,
        vec![DiffOp::Remove { index: 1 }, DiffOp::Remove { index: 0 }]
    );
    assert!(diff_tasks(&tasks, &tasks).is_empty());
}

#[test]
fn replaying_on_unrelated_lists_is_refused() {
    let old: Vec<Task> = (1..=3).map(|id| stored(id, &format!("t{id}"))).collect();
    let new = vec![stored(3, "t3"), stored(4, "t4"), stored(1, "t1 edited")];
    let diff = diff_tasks(&old, &new);

    assert_eq!(diff.apply(&old[..1], &new), None);
    assert_eq!(diff.apply(&old, &[]), None);
    assert_eq!(diff.apply(&old, &new), Some(new.clone()));
}
