use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use board_block::{
    Clipboard, Dashboard, ListState, ShareError, SubmitOutcome, TaskDetail, TaskView,
    COPY_INDICATOR_DELAY,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tarefas_atoms::store::MemoryStore;
use tarefas_atoms::tasks::{self, CreateTaskPayload, Task};
use tarefas_atoms::users::{SessionState, Viewer};

#[derive(Default)]
struct RecordingClipboard {
    written: Mutex<Vec<String>>,
}

#[async_trait]
impl Clipboard for RecordingClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ShareError> {
        self.written.lock().push(text.to_string());
        Ok(())
    }
}

fn alice() -> Viewer {
    Viewer::new("a@x.com", "Alice")
}

fn bob() -> Viewer {
    Viewer::new("b@y.com", "Bob")
}

async fn dashboard_for(store: &Arc<MemoryStore>, viewer: Viewer) -> Dashboard {
    let mut dashboard = Dashboard::new(
        store.clone(),
        Arc::new(RecordingClipboard::default()),
        "https://tarefas.example.com",
    );
    dashboard
        .set_session(SessionState::Authenticated(viewer))
        .await
        .unwrap();
    dashboard
}

async fn wait_for_list(
    dashboard: &Dashboard,
    accept: impl Fn(&[Task]) -> bool,
) -> Vec<Task> {
    let mut rx = dashboard.watch_tasks();
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| matches!(s, ListState::Ready(items) if accept(items))),
    )
    .await
    .expect("timed out waiting for snapshot")
    .expect("sender dropped");
    state.items().to_vec()
}

async fn submit(dashboard: &mut Dashboard, text: &str, is_public: bool) -> String {
    dashboard.form.input = text.to_string();
    dashboard.form.is_public = is_public;
    match dashboard.submit().await.unwrap() {
        SubmitOutcome::Created { id } | SubmitOutcome::Updated { id } => id,
        SubmitOutcome::WriteFailed(message) => panic!("write failed: {message}"),
    }
}

#[tokio::test]
async fn create_then_edit_keeps_identity_owner_and_timestamp() {
    let store = Arc::new(MemoryStore::new());
    let mut dashboard = dashboard_for(&store, alice()).await;
    wait_for_list(&dashboard, |items| items.is_empty()).await;

    let id = submit(&mut dashboard, "Buy milk", false).await;
    assert_eq!(dashboard.form.input, "");
    assert!(!dashboard.form.is_public);

    let created = wait_for_list(&dashboard, |items| items.len() == 1).await;
    assert_eq!(created[0].id, id);
    assert_eq!(created[0].owner, "a@x.com");
    assert_eq!(created[0].text, "Buy milk");
    assert!(!created[0].is_public);

    assert!(dashboard.begin_edit(&id));
    assert_eq!(dashboard.form.input, "Buy milk");
    dashboard.form.input = "Buy oat milk".to_string();
    dashboard.form.is_public = true;
    assert_eq!(
        dashboard.submit().await.unwrap(),
        SubmitOutcome::Updated { id: id.clone() }
    );
    assert_eq!(dashboard.form.edit_task_id, None);

    let edited = wait_for_list(&dashboard, |items| {
        items.len() == 1 && items[0].is_public
    })
    .await;
    assert_eq!(edited[0].id, id);
    assert_eq!(edited[0].text, "Buy oat milk");
    assert_eq!(edited[0].owner, created[0].owner);
    assert_eq!(edited[0].created_at, created[0].created_at);
}

#[tokio::test]
async fn created_tasks_get_fresh_ids_and_newest_first_order() {
    let store = Arc::new(MemoryStore::new());
    let mut dashboard = dashboard_for(&store, alice()).await;

    let first = submit(&mut dashboard, "one", true).await;
    tokio::time::sleep(Duration::from_millis(2)).await;
    let second = submit(&mut dashboard, "two", false).await;
    assert_ne!(first, second);

    let items = wait_for_list(&dashboard, |items| items.len() == 2).await;
    let ids: Vec<&str> = items.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);
}

#[tokio::test]
async fn other_owners_tasks_never_reach_the_list() {
    let store = Arc::new(MemoryStore::new());
    tasks::create_task(
        &*store,
        Some(&bob()),
        CreateTaskPayload {
            text: "bob's".to_string(),
            is_public: true,
        },
    )
    .await
    .unwrap();

    let mut dashboard = dashboard_for(&store, alice()).await;
    let mine = submit(&mut dashboard, "mine", false).await;

    let items = wait_for_list(&dashboard, |items| items.len() == 1).await;
    assert_eq!(items[0].id, mine);
}

#[rstest]
#[case::single_task(1)]
#[case::several_tasks(3)]
#[tokio::test]
async fn cancelled_delete_changes_nothing(#[case] count: usize) {
    let store = Arc::new(MemoryStore::new());
    let mut dashboard = dashboard_for(&store, alice()).await;
    for i in 0..count {
        submit(&mut dashboard, &format!("task {i}"), false).await;
    }
    let before = wait_for_list(&dashboard, |items| items.len() == count).await;
    let writes = store.writes();

    dashboard.request_delete(&before[0].id);
    assert_eq!(dashboard.pending_delete(), Some(before[0].id.as_str()));
    dashboard.cancel_delete();
    assert_eq!(dashboard.confirm_delete().await, None);

    assert_eq!(store.writes(), writes);
    assert_eq!(dashboard.tasks(), ListState::Ready(before));
}

#[tokio::test]
async fn confirmed_delete_reaches_the_list_through_the_subscription() {
    let store = Arc::new(MemoryStore::new());
    let mut dashboard = dashboard_for(&store, alice()).await;
    let keep = submit(&mut dashboard, "keep", false).await;
    let gone = submit(&mut dashboard, "gone", false).await;
    wait_for_list(&dashboard, |items| items.len() == 2).await;

    dashboard.request_delete(&gone);
    assert_eq!(dashboard.confirm_delete().await, Some(gone));

    let items = wait_for_list(&dashboard, |items| items.len() == 1).await;
    assert_eq!(items[0].id, keep);
    assert_eq!(dashboard.pending_delete(), None);
}

#[tokio::test]
async fn failed_delete_clears_the_confirmation() {
    let store = Arc::new(MemoryStore::new());
    let mut dashboard = dashboard_for(&store, alice()).await;
    let id = submit(&mut dashboard, "stuck", false).await;
    wait_for_list(&dashboard, |items| items.len() == 1).await;

    store.fail_writes(true);
    dashboard.request_delete(&id);
    assert_eq!(dashboard.confirm_delete().await, None);
    assert_eq!(dashboard.pending_delete(), None);
    assert_eq!(dashboard.tasks().items().len(), 1);
}

#[tokio::test]
async fn sign_out_and_in_as_someone_else_swaps_the_list() {
    let store = Arc::new(MemoryStore::new());
    let mut dashboard = dashboard_for(&store, alice()).await;
    submit(&mut dashboard, "alice's", false).await;
    wait_for_list(&dashboard, |items| items.len() == 1).await;

    dashboard.set_session(SessionState::Anonymous).await.unwrap();
    wait_for_list(&dashboard, |items| items.is_empty()).await;

    dashboard
        .set_session(SessionState::Authenticated(bob()))
        .await
        .unwrap();
    let items = wait_for_list(&dashboard, |_| true).await;
    assert!(items.is_empty());
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(store.subscriber_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn copied_indicator_follows_the_latest_copy() {
    let store = Arc::new(MemoryStore::new());
    let mut dashboard = dashboard_for(&store, alice()).await;
    let id = submit(&mut dashboard, "share me", true).await;
    wait_for_list(&dashboard, |items| items.len() == 1).await;

    let link = dashboard.copy_link(&id).await.unwrap();
    assert_eq!(link, format!("https://tarefas.example.com/task/{id}"));
    assert_eq!(dashboard.copied(), Some(id.clone()));

    tokio::time::sleep(COPY_INDICATOR_DELAY / 2).await;
    dashboard.copy_link(&id).await.unwrap();
    tokio::time::sleep(COPY_INDICATOR_DELAY - Duration::from_millis(1)).await;
    assert_eq!(dashboard.copied(), Some(id));

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(dashboard.copied(), None);
}

#[tokio::test]
async fn posted_comment_shows_up_at_the_head_immediately() {
    let store = Arc::new(MemoryStore::new());
    let task = tasks::create_task(
        &*store,
        Some(&alice()),
        CreateTaskPayload {
            text: "Buy milk".to_string(),
            is_public: true,
        },
    )
    .await
    .unwrap();

    let mut detail = TaskDetail::new(
        store.clone(),
        &task.id,
        SessionState::Authenticated(bob()),
        Vec::new(),
    );
    assert_eq!(detail.load().await.unwrap(), &TaskView::Loaded(task.clone()));
    assert_eq!(store.subscriber_count(), 0);

    detail.set_input("Nice!");
    let posted = detail.submit_comment().await.unwrap().unwrap();

    assert_eq!(detail.comments().len(), 1);
    assert_eq!(detail.comments()[0], posted);
    assert_eq!(posted.text, "Nice!");
    assert_eq!(posted.author_name, "Bob");
    assert_eq!(posted.author_id, "b@y.com");
    assert_eq!(posted.task_id, task.id);
    assert_eq!(detail.input(), "");
}

#[rstest]
#[case::anonymous(SessionState::Anonymous)]
#[case::stranger(SessionState::Authenticated(bob()))]
#[tokio::test]
async fn private_task_detail_never_exposes_the_text(#[case] session: SessionState) {
    let store = Arc::new(MemoryStore::new());
    let task = tasks::create_task(
        &*store,
        Some(&alice()),
        CreateTaskPayload {
            text: "secret plan".to_string(),
            is_public: false,
        },
    )
    .await
    .unwrap();

    let mut detail = TaskDetail::new(store.clone(), &task.id, session, Vec::new());
    assert_eq!(detail.load().await.unwrap(), &TaskView::NotAllowed);
}
