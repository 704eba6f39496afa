#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use taskgen::db::db::Db;
    use taskgen::db::todos::Todos;
    use taskgen::libs::store::{Field, Filter, Query, TaskStore};
    use taskgen::libs::task::{Priority, Task, TaskKind};
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};

    struct TodosTestContext {
        temp_dir: TempDir,
        store: Todos,
    }

    impl AsyncTestContext for TodosTestContext {
        async fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let store = Todos::open(&temp_dir.path().join("taskgen.db")).unwrap();
            TodosTestContext { temp_dir, store }
        }
    }

    fn created(offset_secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(1_700_000_000_123_456).unwrap() + Duration::seconds(offset_secs)
    }

    fn main_task(id: &str, title: &str, offset_secs: i64) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            completed: false,
            owner: "owner-1".to_string(),
            created_time: created(offset_secs),
            kind: TaskKind::Main { priority: Priority::None },
        }
    }

    fn subtask(id: &str, parent_id: &str, order: u32) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Step {}", order),
            completed: false,
            owner: "owner-1".to_string(),
            created_time: created(0),
            kind: TaskKind::Subtask {
                parent_id: parent_id.to_string(),
                order,
            },
        }
    }

    #[test_context(TodosTestContext)]
    #[tokio::test]
    async fn test_set_and_get_roundtrip(ctx: &mut TodosTestContext) {
        let task = main_task("m1", "Plan a trip", 0);
        ctx.store.set(&task).await.unwrap();

        assert_eq!(ctx.store.get("m1").await.unwrap(), Some(task));
        assert_eq!(ctx.store.get("missing").await.unwrap(), None);
    }

    #[test_context(TodosTestContext)]
    #[tokio::test]
    async fn test_tasks_survive_reopen(ctx: &mut TodosTestContext) {
        ctx.store.set(&main_task("m1", "Plan a trip", 0)).await.unwrap();
        ctx.store.set(&subtask("s1", "m1", 0)).await.unwrap();

        let reopened = Todos::open(&ctx.temp_dir.path().join("taskgen.db")).unwrap();
        assert_eq!(reopened.count(&Query::new()).await.unwrap(), 2);
        assert_eq!(reopened.get("s1").await.unwrap().unwrap().parent_id(), Some("m1"));
    }

    #[test_context(TodosTestContext)]
    #[tokio::test]
    async fn test_main_tasks_newest_first(ctx: &mut TodosTestContext) {
        ctx.store.set(&main_task("old", "Old", 0)).await.unwrap();
        ctx.store.set(&main_task("new", "New", 60)).await.unwrap();
        ctx.store.set(&subtask("s1", "old", 0)).await.unwrap();

        assert_eq!(ctx.store.count(&Query::main_tasks()).await.unwrap(), 2);
        let ids: Vec<_> = ctx
            .store
            .query(&Query::main_tasks_newest_first())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test_context(TodosTestContext)]
    #[tokio::test]
    async fn test_subtasks_of_are_ordered(ctx: &mut TodosTestContext) {
        ctx.store.set(&main_task("m1", "Trip", 0)).await.unwrap();
        ctx.store.set(&main_task("m2", "Clean", 0)).await.unwrap();
        ctx.store.set(&subtask("c", "m1", 2)).await.unwrap();
        ctx.store.set(&subtask("a", "m1", 0)).await.unwrap();
        ctx.store.set(&subtask("b", "m1", 1)).await.unwrap();
        ctx.store.set(&subtask("x", "m2", 0)).await.unwrap();

        let subtasks = ctx.store.query(&Query::subtasks_of("m1")).await.unwrap();

        let orders: Vec<_> = subtasks.iter().map(|t| t.order()).collect();
        assert_eq!(orders, vec![Some(0), Some(1), Some(2)]);
        assert!(subtasks.iter().all(|t| t.priority().is_none()));
        assert_eq!(ctx.store.count(&Query::subtasks_of("m2")).await.unwrap(), 1);
    }

    #[test_context(TodosTestContext)]
    #[tokio::test]
    async fn test_equality_filter_binds_value(ctx: &mut TodosTestContext) {
        ctx.store.set(&main_task("m1", "Trip", 0)).await.unwrap();
        ctx.store.set(&subtask("s1", "m1", 0)).await.unwrap();

        let injected = Query::new().filter(Filter::Equals(Field::ParentId, "m1' OR '1'='1".to_string()));
        assert_eq!(ctx.store.count(&injected).await.unwrap(), 0);
    }

    #[test_context(TodosTestContext)]
    #[tokio::test]
    async fn test_merge_keeps_owner_and_created_time(ctx: &mut TodosTestContext) {
        let original = main_task("m1", "Plan a trip", 0);
        ctx.store.set(&original).await.unwrap();

        let mut update = original.clone();
        update.title = "Plan a trip to Crete".to_string();
        update.completed = true;
        update.owner = "someone-else".to_string();
        update.created_time = created(3600);
        update.kind = TaskKind::Main { priority: Priority::High };
        ctx.store.merge(&update).await.unwrap();

        let stored = ctx.store.get("m1").await.unwrap().unwrap();
        assert_eq!(stored.title, "Plan a trip to Crete");
        assert!(stored.completed);
        assert_eq!(stored.priority(), Some(Priority::High));
        assert_eq!(stored.owner, original.owner);
        assert_eq!(stored.created_time, original.created_time);
    }

    #[test_context(TodosTestContext)]
    #[tokio::test]
    async fn test_merge_creates_missing_task(ctx: &mut TodosTestContext) {
        let task = subtask("s1", "m1", 3);
        ctx.store.merge(&task).await.unwrap();
        assert_eq!(ctx.store.get("s1").await.unwrap(), Some(task));
    }

    #[test_context(TodosTestContext)]
    #[tokio::test]
    async fn test_set_replaces_task(ctx: &mut TodosTestContext) {
        ctx.store.set(&main_task("m1", "Before", 0)).await.unwrap();
        let replacement = main_task("m1", "After", 30);
        ctx.store.set(&replacement).await.unwrap();

        assert_eq!(ctx.store.get("m1").await.unwrap(), Some(replacement));
        assert_eq!(ctx.store.count(&Query::new()).await.unwrap(), 1);
    }

    #[test_context(TodosTestContext)]
    #[tokio::test]
    async fn test_delete(ctx: &mut TodosTestContext) {
        ctx.store.set(&main_task("m1", "Trip", 0)).await.unwrap();

        ctx.store.delete("m1").await.unwrap();
        ctx.store.delete("m1").await.unwrap();

        assert!(ctx.store.get("m1").await.unwrap().is_none());
    }

    #[test_context(TodosTestContext)]
    #[tokio::test]
    async fn test_rows_with_both_priority_and_parent_are_rejected(ctx: &mut TodosTestContext) {
        let db = Db::open(&ctx.temp_dir.path().join("taskgen.db")).unwrap();
        let inserted = db.conn.execute(
            "INSERT INTO todos (id, title, completed, owner, created_time, priority, sort_order, parent_id)
             VALUES ('bad', 'Bad', 0, 'o', 0, 'low', 0, 'm1')",
            [],
        );
        assert!(inserted.is_err());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let store = Todos::in_memory().unwrap();
        let first = store.new_id();
        let second = store.new_id();
        assert_eq!(first.len(), 20);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }
}
