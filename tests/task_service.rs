mod common;

#[cfg(test)]
mod tests {
    use super::common::{offline_service, service, FakeAuth, FakeGenerator};
    use chrono::{Duration, Utc};
    use std::sync::atomic::Ordering;
    use std::time::Duration as StdDuration;
    use taskgen::libs::generation::{GenerationError, ResponseSchema};
    use taskgen::libs::identity::LOCAL_ID_PREFIX;
    use taskgen::libs::messages::Message;
    use taskgen::libs::notify::AppError;
    use taskgen::libs::store::{StoreError, TaskStore};
    use taskgen::libs::task::{Draft, Priority, Task, TaskKind};

    const SUBTASKS: &str = r#"{"subtasks":[{"title":"Pick islands","order":1},{"title":"Set a budget","order":0},{"title":"Book ferries","order":2}]}"#;

    fn drafts(titles: &[&str]) -> Vec<Draft> {
        titles.iter().map(|title| Draft::subtask(*title)).collect()
    }

    fn main_task(id: &str, created_time: chrono::DateTime<Utc>) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {}", id),
            completed: false,
            owner: "u1".to_string(),
            created_time,
            kind: TaskKind::Main { priority: Priority::None },
        }
    }

    #[tokio::test]
    async fn test_empty_store_skips_ordered_query() {
        let service = offline_service(FakeGenerator::new()).await;

        let tasks = service.load_tasks().await;

        assert!(tasks.is_empty());
        assert_eq!(service.store().counts.lock().len(), 1);
        assert_eq!(service.store().ordered_queries(), 0);
        assert!(service.notifier().notifications().is_empty());
    }

    #[tokio::test]
    async fn test_load_tasks_newest_first() {
        let service = offline_service(FakeGenerator::new()).await;
        let t1 = Utc::now() - Duration::minutes(5);
        let t2 = Utc::now();
        service.store().set(&main_task("older", t1)).await.unwrap();
        service.store().set(&main_task("newer", t2)).await.unwrap();

        let ids: Vec<_> = service.load_tasks().await.into_iter().map(|t| t.id).collect();

        assert_eq!(ids, vec!["newer".to_string(), "older".to_string()]);
        assert_eq!(service.store().ordered_queries(), 1);
    }

    #[tokio::test]
    async fn test_load_tasks_is_broadcast() {
        let service = offline_service(FakeGenerator::new()).await;
        service.store().set(&main_task("m1", Utc::now())).await.unwrap();
        let mut receiver = service.subscribe();

        service.load_tasks().await;

        let broadcast = receiver.recv().await.unwrap();
        assert_eq!(broadcast.len(), 1);
        assert_eq!(broadcast[0].id, "m1");
    }

    #[tokio::test]
    async fn test_add_assigns_order_by_position_and_round_trips() {
        let service = service(FakeGenerator::new(), FakeAuth::signed_in("anon-42")).await;
        let mut main = Draft::maintask("Plan a trip to Greece");
        main.completed = true;

        let saved = service
            .add_maintask_with_subtasks(&main, &drafts(&["Set a budget", "Pick islands", "Book ferries"]))
            .await
            .unwrap();

        let orders: Vec<_> = saved.subtasks.iter().filter_map(Task::order).collect();
        assert_eq!(orders, vec![0, 1, 2]);

        let loaded = service.load_tasks().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, saved.maintask.id);
        assert_eq!(loaded[0].title, "Plan a trip to Greece");
        assert!(loaded[0].completed);
        assert_eq!(loaded[0].owner, "anon-42");
        assert_eq!(loaded[0].priority(), Some(Priority::None));

        let subtasks = service.load_subtasks(&saved.maintask.id).await.unwrap();
        let titles: Vec<_> = subtasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Set a budget", "Pick islands", "Book ferries"]);
        assert!(subtasks.iter().all(|t| t.owner == "anon-42" && !t.completed));
        assert!(subtasks.iter().all(|t| t.parent_id() == Some(saved.maintask.id.as_str())));
    }

    #[tokio::test]
    async fn test_load_tasks_with_subtasks_groups_by_main_task() {
        let service = offline_service(FakeGenerator::new()).await;
        service
            .add_maintask_with_subtasks(&Draft::maintask("Clean this room"), &drafts(&["Dust", "Vacuum"]))
            .await
            .unwrap();

        let groups = service.load_tasks_with_subtasks().await.unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].maintask.title, "Clean this room");
        assert_eq!(groups[0].subtasks.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_subtasks_then_main_task() {
        let service = offline_service(FakeGenerator::new()).await;
        let saved = service
            .add_maintask_with_subtasks(&Draft::maintask("Trip"), &drafts(&["Book", "Pack"]))
            .await
            .unwrap();

        service.delete_maintask_and_subtasks(&saved.maintask.id).await.unwrap();

        assert!(service.load_subtasks(&saved.maintask.id).await.unwrap().is_empty());
        assert!(service.load_tasks().await.is_empty());
        let deleted = service.store().deleted.lock().clone();
        assert_eq!(deleted.last(), Some(&saved.maintask.id));
        assert_eq!(deleted.len(), 3);
    }

    #[tokio::test]
    async fn test_partial_add_failure_is_reported_and_not_repaired() {
        let service = offline_service(FakeGenerator::new()).await;
        service.store().fail_set_at(2, StoreError::Api {
            status: 500,
            message: "backend unavailable".to_string(),
        });

        let result = service
            .add_maintask_with_subtasks(&Draft::maintask("Trip"), &drafts(&["Book", "Pack", "Go"]))
            .await;

        assert!(matches!(result, Err(AppError::Store(StoreError::Api { status: 500, .. }))));
        assert_eq!(service.store().all().await.len(), 2);
        let notifications = service.notifier().notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, Message::StoreAddFailed.to_string());
        assert_eq!(notifications[0].duration, StdDuration::from_secs(3));
    }

    #[tokio::test]
    async fn test_update_merges_without_changing_owner() {
        let service = service(FakeGenerator::new(), FakeAuth::signed_in("owner-1")).await;
        let saved = service
            .add_maintask_with_subtasks(&Draft::maintask("Trip"), &[])
            .await
            .unwrap();

        let mut changed = saved.maintask.clone();
        changed.completed = true;
        changed.owner = "someone-else".to_string();
        service.update_task(&changed).await.unwrap();

        let stored = service.store().get(&saved.maintask.id).await.unwrap().unwrap();
        assert!(stored.completed);
        assert_eq!(stored.owner, "owner-1");
        assert_eq!(stored.created_time, saved.maintask.created_time);
    }

    #[tokio::test]
    async fn test_update_permission_denied_shows_remediation() {
        let service = offline_service(FakeGenerator::new()).await;
        service
            .store()
            .fail_next_merge(StoreError::PermissionDenied("Missing or insufficient permissions.".to_string()));

        let result = service.update_task(&main_task("m1", Utc::now())).await;

        assert!(result.is_err());
        let notifications = service.notifier().notifications();
        assert_eq!(notifications[0].message, Message::StorePermissionDenied.to_string());
        assert_eq!(notifications[0].duration, StdDuration::from_secs(10));
    }

    #[tokio::test]
    async fn test_missing_index_is_swallowed() {
        let service = offline_service(FakeGenerator::new()).await;
        service.store().set(&main_task("m1", Utc::now())).await.unwrap();
        service
            .store()
            .fail_next_query(StoreError::MissingIndex("The query requires an index".to_string()));

        assert!(service.load_tasks().await.is_empty());
        assert!(service.notifier().notifications().is_empty());
    }

    #[tokio::test]
    async fn test_generate_task_without_prompt_or_image() {
        let service = offline_service(FakeGenerator::new()).await;

        let generated = service.generate_task("  ", None).await.unwrap();

        assert_eq!(generated.title, "Please provide a prompt");
        assert!(generated.subtasks.is_empty());
        assert!(service.generator().requests.lock().clone().is_empty());
    }

    #[tokio::test]
    async fn test_generate_task_parses_title_and_subtasks() {
        let generator = FakeGenerator::new().respond(r#"{"title":"Greek island trip","subtasks":["Book","Pack"]}"#);
        let service = offline_service(generator).await;

        let generated = service.generate_task("Plan a trip to Greece", None).await.unwrap();

        assert_eq!(generated.title, "Greek island trip");
        assert_eq!(generated.subtasks, vec!["Book".to_string(), "Pack".to_string()]);
        let requests = service.generator().requests.lock().clone();
        assert_eq!(requests[0].schema, ResponseSchema::Task);
        assert_eq!(requests[0].prompt, "Plan a trip to Greece");
    }

    #[tokio::test]
    async fn test_generate_subtasks_sorted_and_excludes_existing() {
        let service = offline_service(FakeGenerator::new().respond(SUBTASKS)).await;

        let generated = service
            .generate_subtasks("Plan a trip", &["Renew passport".to_string()], None)
            .await
            .unwrap();

        let titles: Vec<_> = generated.subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Set a budget", "Pick islands", "Book ferries"]);
        let requests = service.generator().requests.lock().clone();
        assert_eq!(requests[0].schema, ResponseSchema::Subtasks);
        assert!(requests[0].prompt.contains("Renew passport"));
    }

    #[tokio::test]
    async fn test_invalid_api_key_shows_remediation_not_raw_message() {
        let generator = FakeGenerator::new().fail(GenerationError::Api {
            status: 400,
            message: "API key not valid. Please pass a valid API key.".to_string(),
        });
        let service = offline_service(generator).await;

        let result = service.generate_subtasks("Plan a trip", &[], None).await;

        assert!(matches!(result, Err(AppError::Generation(ref e)) if e.is_invalid_api_key()));
        let notifications = service.notifier().notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, Message::GeminiApiKeyInvalid.to_string());
        assert!(!notifications[0].message.contains("API key not valid"));
        assert_eq!(notifications[0].duration, StdDuration::from_secs(10));
    }

    #[tokio::test]
    async fn test_non_conforming_json_uses_fallback_message() {
        let service = offline_service(FakeGenerator::new().respond("not json")).await;

        let result = service.generate_subtasks("Plan a trip", &[], None).await;

        assert!(matches!(result, Err(AppError::Generation(GenerationError::InvalidResponse(_)))));
        let notifications = service.notifier().notifications();
        assert_eq!(notifications[0].message, "Failed to generate subtasks");
        assert_eq!(notifications[0].duration, StdDuration::from_secs(3));
    }

    #[tokio::test]
    async fn test_failed_sign_in_falls_back_to_stable_local_id() {
        let service = offline_service(FakeGenerator::new()).await;

        let owner = service.owner();

        assert!(owner.starts_with(LOCAL_ID_PREFIX));
        assert_eq!(service.owner(), owner);
        assert_eq!(service.current_user(), None);
        assert_eq!(service.auth().attempts.load(Ordering::SeqCst), 1);
        assert!(service.notifier().notifications().is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_switches_owner_to_local_id() {
        let service = service(FakeGenerator::new(), FakeAuth::signed_in("anon-7")).await;
        assert_eq!(service.owner(), "anon-7");

        service.sign_out().await.unwrap();

        assert_eq!(service.owner(), service.local_uid());
    }

    #[tokio::test]
    async fn test_auth_change_reloads_tasks() {
        let service = service(FakeGenerator::new(), FakeAuth::signed_in("anon-8")).await;
        service.store().set(&main_task("m1", Utc::now())).await.unwrap();

        let (reloaded, signed_out) = tokio::join!(service.follow_auth_changes(), service.sign_out());

        signed_out.unwrap();
        assert_eq!(reloaded.map(|tasks| tasks.len()), Some(1));
    }
}
