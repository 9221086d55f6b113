//! The cooperative wait loop derived node actions are awaited through.
use anyhow::Result;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_models::ActionStatus;
use fleetcore_models::ResultCode;
use fleetcore_store::ActionStore;

use crate::control::ActionControl;
use crate::config::ExecutorConfig;

/// Block (cooperatively) until every dependent of `action_id` has reached a terminal
/// status, or until cancellation/timeout is observed.
///
/// Tie-break order, checked every iteration per spec §4.1.1: cancel before timeout
/// before failure before completion.
pub async fn wait_for_dependents(
    context: &Context,
    store: &ActionStore,
    control: &ActionControl,
    action_id: Uuid,
    config: &ExecutorConfig,
) -> Result<(ResultCode, String)> {
    loop {
        if control.is_cancelled() {
            return Ok((ResultCode::Cancel, format!("ACTION [{}] cancelled", action_id)));
        }
        if control.is_timeout() {
            return Ok((ResultCode::Timeout, format!("ACTION [{}] timeout", action_id)));
        }

        let dependents = store.list_dependents(context, action_id).await?;
        let mut all_terminal = true;
        let mut failed: Option<Uuid> = None;
        for dependent_id in &dependents {
            let dependent = store
                .get(context, *dependent_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("dependent action {} missing from store", dependent_id))?;
            match dependent.status {
                ActionStatus::Succeeded => {}
                ActionStatus::Failed => {
                    failed = Some(*dependent_id);
                    break;
                }
                ActionStatus::Cancelled => {
                    failed = Some(*dependent_id);
                    break;
                }
                _ => all_terminal = false,
            }
        }

        if failed.is_some() {
            return Ok((ResultCode::Error, format!("ACTION [{}] failed", action_id)));
        }
        if all_terminal {
            return Ok((ResultCode::Ok, "All dependents ended with success".to_string()));
        }

        tokio::time::sleep(config.poll_interval()).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fleetcore_context::Context;
    use fleetcore_models::Action;
    use fleetcore_models::ActionKind;
    use fleetcore_models::ActionStatus;
    use fleetcore_models::Owner;
    use fleetcore_models::ResultCode;
    use fleetcore_store::StoreFixture;
    use uuid::Uuid;

    use super::*;
    use crate::control::ActionControlRegistry;

    fn owner() -> Owner {
        Owner::new("user", "project", "default")
    }

    #[tokio::test]
    async fn returns_ok_once_all_dependents_succeed() {
        let context = Context::fixture();
        let fixture = StoreFixture::new();
        let store = fixture.action_store();
        let config = ExecutorConfig::fixture();

        let parent = Action::new_top_level(Uuid::new_v4(), ActionKind::ClusterScaleOut, owner());
        let parent = store.store(&context, parent).await.unwrap();
        let child = Action::derived(&parent, "create", Uuid::new_v4(), ActionKind::NodeCreate, Default::default());
        let child = store.store(&context, child).await.unwrap();
        store.add_dependency(&context, child.id, parent.id).await.unwrap();

        let registry = ActionControlRegistry::new();
        let control = registry.begin(parent.id, Duration::from_secs(60));

        let store_clone = store.clone();
        let context_clone = context.clone();
        let child_id = child.id;
        let setter = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            store_clone
                .set_status(&context_clone, child_id, ActionStatus::Succeeded, Some(ResultCode::Ok), None)
                .await
                .unwrap();
        });

        let (code, message) = wait_for_dependents(&context, &store, &control, parent.id, &config)
            .await
            .unwrap();
        setter.await.unwrap();
        assert_eq!(code, ResultCode::Ok);
        assert_eq!(message, "All dependents ended with success");
    }

    #[tokio::test]
    async fn returns_error_when_a_dependent_fails() {
        let context = Context::fixture();
        let fixture = StoreFixture::new();
        let store = fixture.action_store();
        let config = ExecutorConfig::fixture();

        let parent = Action::new_top_level(Uuid::new_v4(), ActionKind::ClusterScaleOut, owner());
        let parent = store.store(&context, parent).await.unwrap();
        let child = Action::derived(&parent, "create", Uuid::new_v4(), ActionKind::NodeCreate, Default::default());
        let child = store.store(&context, child).await.unwrap();
        store.add_dependency(&context, child.id, parent.id).await.unwrap();
        store
            .set_status(&context, child.id, ActionStatus::Failed, Some(ResultCode::Error), None)
            .await
            .unwrap();

        let registry = ActionControlRegistry::new();
        let control = registry.begin(parent.id, Duration::from_secs(60));

        let (code, message) = wait_for_dependents(&context, &store, &control, parent.id, &config)
            .await
            .unwrap();
        assert_eq!(code, ResultCode::Error);
        assert_eq!(message, format!("ACTION [{}] failed", parent.id));
    }

    #[tokio::test]
    async fn cancellation_takes_priority() {
        let context = Context::fixture();
        let fixture = StoreFixture::new();
        let store = fixture.action_store();
        let config = ExecutorConfig::fixture();

        let parent = Action::new_top_level(Uuid::new_v4(), ActionKind::ClusterScaleOut, owner());
        let parent = store.store(&context, parent).await.unwrap();

        let registry = ActionControlRegistry::new();
        let control = registry.begin(parent.id, Duration::from_secs(60));
        control.cancel();

        let (code, message) = wait_for_dependents(&context, &store, &control, parent.id, &config)
            .await
            .unwrap();
        assert_eq!(code, ResultCode::Cancel);
        assert_eq!(message, format!("ACTION [{}] cancelled", parent.id));
    }

    #[tokio::test]
    async fn no_dependents_returns_ok_immediately() {
        let context = Context::fixture();
        let fixture = StoreFixture::new();
        let store = fixture.action_store();
        let config = ExecutorConfig::fixture();

        let parent = Action::new_top_level(Uuid::new_v4(), ActionKind::ClusterUpdate, owner());
        let parent = store.store(&context, parent).await.unwrap();

        let registry = ActionControlRegistry::new();
        let control = registry.begin(parent.id, Duration::from_secs(60));
        let (code, message) = wait_for_dependents(&context, &store, &control, parent.id, &config)
            .await
            .unwrap();
        assert_eq!(code, ResultCode::Ok);
        assert_eq!(message, "All dependents ended with success");
    }
}
