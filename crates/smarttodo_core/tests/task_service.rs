use smarttodo_core::db::{into_shared, open_db_in_memory};
use smarttodo_core::{Priority, ServiceError, Task, TaskQuery, TaskService};
use std::time::Duration;
use tokio::sync::watch;

const WAIT: Duration = Duration::from_secs(5);

fn service() -> TaskService {
    TaskService::new(into_shared(open_db_in_memory().unwrap())).unwrap()
}

fn task(title: &str, priority: Priority, created_at: i64) -> Task {
    let mut task = Task::with_created_at(title, created_at);
    task.priority = priority;
    task
}

fn titles(tasks: &[Task]) -> Vec<String> {
    tasks.iter().map(|task| task.title.clone()).collect()
}

#[tokio::test]
async fn writes_refresh_all_standing_lists() {
    let service = service();
    let all = service.all_tasks();
    let incomplete = service.incomplete_tasks();
    let completed = service.completed_tasks();
    assert!(all.borrow().is_empty());

    let low = service.insert(task("low", Priority::Low, 1)).await.unwrap();
    service.insert(task("high", Priority::High, 2)).await.unwrap();

    assert_eq!(titles(&all.borrow()), vec!["high", "low"]);
    assert_eq!(titles(&incomplete.borrow()), vec!["high", "low"]);

    let toggled = service.toggle_completion(low).await.unwrap();
    assert!(toggled.is_completed);
    assert_eq!(titles(&incomplete.borrow()), vec!["high"]);
    assert_eq!(titles(&completed.borrow()), vec!["low"]);
    assert_eq!(service.count().await.unwrap(), 2);
    assert_eq!(service.count_completed().await.unwrap(), 1);
}

#[tokio::test]
async fn toggling_twice_restores_the_task() {
    let service = service();
    let id = service.insert(task("read", Priority::Medium, 7)).await.unwrap();
    let before = service.get_task(id).await.unwrap().unwrap();

    service.toggle_completion(id).await.unwrap();
    let after = service.toggle_completion(id).await.unwrap();

    assert_eq!(after, before);
}

#[tokio::test]
async fn toggling_missing_task_is_not_found() {
    let service = service();
    assert!(matches!(
        service.toggle_completion(404).await,
        Err(ServiceError::NotFound(404))
    ));
}

#[tokio::test]
async fn table_version_counts_successful_writes() {
    let service = service();
    let version = service.table_version();

    let id = service.insert(task("a", Priority::Low, 1)).await.unwrap();
    service.delete(id).await.unwrap();
    assert!(service.delete(id).await.is_err());

    assert_eq!(*version.borrow(), 2);
}

#[tokio::test]
async fn live_search_follows_query_and_table() {
    let service = service();
    service.insert(task("Buy milk", Priority::Low, 1)).await.unwrap();
    service.insert(task("walk dog", Priority::High, 2)).await.unwrap();

    let (query, query_rx) = watch::channel("milk".to_string());
    let mut results = service.search(query_rx);
    tokio::time::timeout(WAIT, results.wait_for(|tasks| titles(tasks) == ["Buy milk"]))
        .await
        .unwrap()
        .unwrap();

    query.send_replace("DOG".to_string());
    tokio::time::timeout(WAIT, results.wait_for(|tasks| titles(tasks) == ["walk dog"]))
        .await
        .unwrap()
        .unwrap();

    let mut extra = task("dog food", Priority::Medium, 3);
    extra.description = Some("for the dog".to_string());
    service.insert(extra).await.unwrap();
    tokio::time::timeout(
        WAIT,
        results.wait_for(|tasks| titles(tasks) == ["walk dog", "dog food"]),
    )
    .await
    .unwrap()
    .unwrap();
}

#[tokio::test]
async fn bulk_deletes_report_counts() {
    let service = service();
    for index in 0..4 {
        let mut item = task(&format!("t{index}"), Priority::Medium, index);
        item.is_completed = index < 3;
        service.insert(item).await.unwrap();
    }

    assert_eq!(service.delete_completed().await.unwrap(), 3);
    assert_eq!(
        titles(&service.list_snapshot(TaskQuery::All).await.unwrap()),
        vec!["t3"]
    );
    assert_eq!(service.delete_all().await.unwrap(), 1);
    assert!(service.all_tasks().borrow().is_empty());
}
