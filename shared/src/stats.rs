use serde::Serialize;
use tarefas_atoms::comments::Comment;
use tarefas_atoms::record::Record;
use tarefas_atoms::store::DocumentStore;
use tarefas_atoms::tasks::Task;
use tarefas_atoms::ServiceError;

/// Home page counters.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Stats {
    pub total_tasks: usize,
    pub total_comments: usize,
}

pub async fn load_stats(store: &dyn DocumentStore) -> Result<Stats, ServiceError> {
    let total_tasks = store
        .count(Task::COLLECTION)
        .await
        .map_err(ServiceError::RemoteRead)?;
    let total_comments = store
        .count(Comment::COLLECTION)
        .await
        .map_err(ServiceError::RemoteRead)?;

    Ok(Stats {
        total_tasks,
        total_comments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tarefas_atoms::comments::{self, CreateCommentPayload};
    use tarefas_atoms::store::MemoryStore;
    use tarefas_atoms::tasks::{self, CreateTaskPayload};
    use tarefas_atoms::users::Viewer;

    #[tokio::test]
    async fn counts_every_task_and_comment() {
        let store = MemoryStore::new();
        let alice = Viewer::new("a@x.com", "Alice");
        for is_public in [true, false] {
            tasks::create_task(
                &store,
                Some(&alice),
                CreateTaskPayload {
                    text: "task".to_string(),
                    is_public,
                },
            )
            .await
            .unwrap();
        }
        comments::create_comment(
            &store,
            Some(&alice),
            "dangling",
            CreateCommentPayload {
                text: "hi".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            load_stats(&store).await.unwrap(),
            Stats {
                total_tasks: 2,
                total_comments: 1,
            }
        );
    }
}
