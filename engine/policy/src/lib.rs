//! Evaluation of attached cluster policies around the executor's BEFORE/AFTER phases.
mod check;
mod handler;
mod registry;

pub use check::policy_check;
pub use check::BASELINE_LEVEL;
pub use handler::CheckOutcome;
pub use handler::Policy;
pub use registry::PolicyRegistry;

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use fleetcore_context::Context;
    use fleetcore_models::CheckStatus;
    use fleetcore_models::Cluster;
    use fleetcore_models::ClusterPolicyBinding;
    use fleetcore_models::ClusterStatus;
    use fleetcore_models::Owner;
    use fleetcore_models::PolicyPhase;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;

    struct CountingPolicy {
        calls: Arc<AtomicUsize>,
        outcome: CheckOutcome,
    }

    #[async_trait::async_trait]
    impl Policy for CountingPolicy {
        fn kind(&self) -> &str {
            "counting"
        }

        async fn check(
            &self,
            _: &Context,
            _: &Cluster,
            _: PolicyPhase,
        ) -> anyhow::Result<CheckOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.outcome.clone())
        }
    }

    fn fixture_cluster() -> Cluster {
        let now = OffsetDateTime::UNIX_EPOCH;
        Cluster {
            id: Uuid::new_v4(),
            profile_id: "profile-1".to_string(),
            desired_capacity: 1,
            min_size: 0,
            max_size: -1,
            status: ClusterStatus::Active,
            status_reason: String::new(),
            node_ids: Vec::new(),
            policies: Vec::new(),
            next_index: 0,
            owner: Owner::new("user", "project", "default"),
            metadata: serde_json::Value::Null,
            created_ts: now,
            updated_ts: now,
        }
    }

    #[tokio::test]
    async fn runs_enabled_bindings_in_priority_order() {
        let context = Context::fixture();
        let mut cluster = fixture_cluster();

        let first_calls = Arc::new(AtomicUsize::new(0));
        let second_calls = Arc::new(AtomicUsize::new(0));
        let first_id = Uuid::new_v4();
        let second_id = Uuid::new_v4();

        let mut binding_first = ClusterPolicyBinding::new(cluster.id, first_id);
        binding_first.priority = 10;
        let mut binding_second = ClusterPolicyBinding::new(cluster.id, second_id);
        binding_second.priority = 1;
        cluster.policies.push(binding_first);
        cluster.policies.push(binding_second);

        let mut builder = PolicyRegistry::build();
        builder.register(
            first_id,
            CountingPolicy {
                calls: first_calls.clone(),
                outcome: CheckOutcome::ok(),
            },
        );
        builder.register(
            second_id,
            CountingPolicy {
                calls: second_calls.clone(),
                outcome: CheckOutcome::ok(),
            },
        );
        let registry = builder.finish();

        let outcome = policy_check(&context, &mut cluster, PolicyPhase::Before, &registry)
            .await
            .unwrap();
        assert_eq!(outcome.status, CheckStatus::Ok);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert!(cluster.policies[0].last_run.is_some());
    }

    #[tokio::test]
    async fn check_error_short_circuits_remaining_bindings() {
        let context = Context::fixture();
        let mut cluster = fixture_cluster();

        let failing_calls = Arc::new(AtomicUsize::new(0));
        let never_calls = Arc::new(AtomicUsize::new(0));
        let failing_id = Uuid::new_v4();
        let never_id = Uuid::new_v4();

        let mut binding_failing = ClusterPolicyBinding::new(cluster.id, failing_id);
        binding_failing.priority = 0;
        let mut binding_never = ClusterPolicyBinding::new(cluster.id, never_id);
        binding_never.priority = 1;
        cluster.policies.push(binding_failing);
        cluster.policies.push(binding_never);

        let mut builder = PolicyRegistry::build();
        builder.register(
            failing_id,
            CountingPolicy {
                calls: failing_calls.clone(),
                outcome: CheckOutcome::check_error("not enough capacity"),
            },
        );
        builder.register(
            never_id,
            CountingPolicy {
                calls: never_calls.clone(),
                outcome: CheckOutcome::ok(),
            },
        );
        let registry = builder.finish();

        let outcome = policy_check(&context, &mut cluster, PolicyPhase::Before, &registry)
            .await
            .unwrap();
        assert_eq!(outcome.status, CheckStatus::CheckError);
        assert_eq!(outcome.reason.as_deref(), Some("not enough capacity"));
        assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
        assert_eq!(never_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn disabled_bindings_are_skipped() {
        let context = Context::fixture();
        let mut cluster = fixture_cluster();

        let calls = Arc::new(AtomicUsize::new(0));
        let policy_id = Uuid::new_v4();
        let mut binding = ClusterPolicyBinding::new(cluster.id, policy_id);
        binding.enabled = false;
        cluster.policies.push(binding);

        let mut builder = PolicyRegistry::build();
        builder.register(
            policy_id,
            CountingPolicy {
                calls: calls.clone(),
                outcome: CheckOutcome::ok(),
            },
        );
        let registry = builder.finish();

        let outcome = policy_check(&context, &mut cluster, PolicyPhase::After, &registry)
            .await
            .unwrap();
        assert_eq!(outcome.status, CheckStatus::Ok);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
