#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use validator_core::{
        config::{FailoverConfig, RosterConfig},
        models::{FailoverPlan, FailoverScenario},
        ErrorKind, SessionGuard, ValidatorError,
    };
    use validator_engine::FailoverDetector;
    use validator_testing_utils::{
        lsid_output, BhostsOutputBuilder, MockConnector, MockLifecycleAction, MockSession, Reply,
        ScriptedExecutor,
    };

    const PRIMARY: &str = "10.241.0.4";
    const ALTERNATE: &str = "10.241.0.5";

    fn detector() -> FailoverDetector {
        FailoverDetector::new(FailoverConfig::default(), &RosterConfig::default())
    }

    fn management_listing() -> String {
        BhostsOutputBuilder::new()
            .without_header()
            .host("hpc-mgmt-1", "ok")
            .host("hpc-mgmt-2", "ok")
            .host("hpc-comp-10-241-0-9", "ok")
            .build()
    }

    /// Session script: master name plus mtimes for the lim and mbatchd logs
    fn cluster_view(master: &str, lim_mtime: &str, mbatchd_mtime: &str) -> ScriptedExecutor {
        ScriptedExecutor::new()
            .on_output("lsid", lsid_output(master))
            .on_output("bhosts -w -noheader", management_listing())
            .on_output("lim.log", lim_mtime)
            .on_output("mbatchd.log", mbatchd_mtime)
    }

    fn session(target: &str, view: ScriptedExecutor) -> (SessionGuard, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
        let session = MockSession::new(target, view);
        let closes = session.close_counter();
        (SessionGuard::new(Box::new(session)), closes)
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_failover_succeeds() {
        let (guard, closes) = session(PRIMARY, cluster_view("hpc-mgmt-1", "1000", "900"));
        let alternate = cluster_view("hpc-mgmt-2", "1050", "900");
        let connector = MockConnector::new().with_target(ALTERNATE, alternate.clone());
        let action = MockLifecycleAction::disconnecting();
        let plan = FailoverPlan::shutdown(PRIMARY, vec![ALTERNATE.to_string()]);

        let report = detector()
            .detect_failover(guard, &action, &connector, &plan)
            .await
            .unwrap();

        assert_eq!(report.scenario, FailoverScenario::Shutdown);
        assert_eq!(report.baseline.master_name, "hpc-mgmt-1");
        assert_eq!(report.post.master_name, "hpc-mgmt-2");
        assert!(report.baseline.same_management_set(&report.post));
        assert!(report.post.captured_at > report.baseline.captured_at);
        assert_eq!(report.reconnected_via, ALTERNATE);
        assert_eq!(report.log_checks.len(), 1);
        assert_eq!(
            report.log_checks[0].path,
            "/mnt/lsf/log/hpc-mgmt-2/lim.log.hpc-mgmt-2"
        );
        assert_eq!((report.log_checks[0].before, report.log_checks[0].after), (1000, 1050));
        assert!(report.restored.is_none());
        assert!(report.elapsed >= Duration::from_secs(120));

        assert_eq!(
            action.stops(),
            vec![("hpc-mgmt-1".to_string(), FailoverScenario::Shutdown)]
        );
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(connector.attempts(), vec![ALTERNATE.to_string()]);
        assert_eq!(connector.closed_sessions(), 1);
        assert_eq!(
            alternate.count_matching("stat -c %Y /mnt/lsf/log/hpc-mgmt-2/lim.log.hpc-mgmt-2"),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_without_failover() {
        let (guard, closes) = session(PRIMARY, cluster_view("hpc-mgmt-1", "1000", "900"));
        let connector = MockConnector::new()
            .with_target(ALTERNATE, cluster_view("hpc-mgmt-1", "1050", "900"));
        let plan = FailoverPlan::shutdown(PRIMARY, vec![ALTERNATE.to_string()]);

        let err = detector()
            .detect_failover(guard, &MockLifecycleAction::disconnecting(), &connector, &plan)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ValidatorError::FailoverDidNotOccur { ref previous, ref current }
                if previous == "hpc-mgmt-1" && current == "hpc-mgmt-1"
        ));
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(connector.closed_sessions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_log_not_updated() {
        let (guard, _) = session(PRIMARY, cluster_view("hpc-mgmt-1", "1000", "900"));
        let connector = MockConnector::new()
            .with_target(ALTERNATE, cluster_view("hpc-mgmt-2", "1000", "900"));
        let plan = FailoverPlan::shutdown(PRIMARY, vec![ALTERNATE.to_string()]);

        let err = detector()
            .detect_failover(guard, &MockLifecycleAction::disconnecting(), &connector, &plan)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ValidatorError::LogNotUpdated {
                before: 1000,
                after: 1000,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_without_disconnect_fails() {
        let (guard, closes) = session(PRIMARY, cluster_view("hpc-mgmt-1", "1000", "900"));
        let connector = MockConnector::new()
            .with_target(ALTERNATE, cluster_view("hpc-mgmt-2", "1050", "900"));
        let action = MockLifecycleAction::disconnecting().with_stop_reply(Reply::output(""));
        let plan = FailoverPlan::shutdown(PRIMARY, vec![ALTERNATE.to_string()]);

        let err = detector()
            .detect_failover(guard, &action, &connector, &plan)
            .await
            .unwrap_err();

        assert!(matches!(err, ValidatorError::TriggerFailed { ref node, .. } if node == "hpc-mgmt-1"));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(connector.attempts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_transport_error_fails() {
        let (guard, _) = session(PRIMARY, cluster_view("hpc-mgmt-1", "1000", "900"));
        let action = MockLifecycleAction::disconnecting()
            .with_stop_reply(Reply::Fail("sudo: a password is required".to_string()));
        let plan = FailoverPlan::reboot(PRIMARY);

        let err = detector()
            .detect_failover(guard, &action, &MockConnector::new(), &plan)
            .await
            .unwrap_err();

        assert!(matches!(err, ValidatorError::TriggerFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_tries_targets_in_order() {
        let (guard, _) = session(PRIMARY, cluster_view("hpc-mgmt-1", "1000", "900"));
        let connector = MockConnector::new()
            .with_target(ALTERNATE, cluster_view("hpc-mgmt-2", "1050", "900"));
        let plan = FailoverPlan::shutdown(
            PRIMARY,
            vec!["10.241.0.6".to_string(), ALTERNATE.to_string()],
        );

        let report = detector()
            .detect_failover(guard, &MockLifecycleAction::disconnecting(), &connector, &plan)
            .await
            .unwrap();

        assert_eq!(report.reconnected_via, ALTERNATE);
        assert_eq!(
            connector.attempts(),
            vec!["10.241.0.6".to_string(), ALTERNATE.to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_exhausted() {
        let (guard, _) = session(PRIMARY, cluster_view("hpc-mgmt-1", "1000", "900"));
        let connector = MockConnector::new();
        let plan = FailoverPlan::shutdown(PRIMARY, vec![ALTERNATE.to_string()]);

        let err = detector()
            .detect_failover(guard, &MockLifecycleAction::disconnecting(), &connector, &plan)
            .await
            .unwrap_err();

        assert!(matches!(err, ValidatorError::Connection { ref target, .. } if target == PRIMARY));
        assert!(err.is_retryable());
        assert_eq!(
            connector.attempts(),
            vec![ALTERNATE.to_string(), PRIMARY.to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reboot_keeps_master() {
        let (guard, closes) = session(PRIMARY, cluster_view("hpc-mgmt-1", "1000", "900"));
        let connector =
            MockConnector::new().with_target(PRIMARY, cluster_view("hpc-mgmt-1", "1000", "960"));
        let action = MockLifecycleAction::disconnecting();

        let report = detector()
            .detect_failover(guard, &action, &connector, &FailoverPlan::reboot(PRIMARY))
            .await
            .unwrap();

        assert_eq!(report.post.master_name, "hpc-mgmt-1");
        assert_eq!(
            report.log_checks[0].path,
            "/mnt/lsf/log/hpc-mgmt-1/mbatchd.log.hpc-mgmt-1"
        );
        assert_eq!((report.log_checks[0].before, report.log_checks[0].after), (900, 960));
        assert!(report.elapsed >= Duration::from_secs(60));
        assert!(report.elapsed < Duration::from_secs(120));
        assert_eq!(
            action.stops(),
            vec![("hpc-mgmt-1".to_string(), FailoverScenario::Reboot)]
        );
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reboot_master_moved() {
        let (guard, _) = session(PRIMARY, cluster_view("hpc-mgmt-1", "1000", "900"));
        let connector =
            MockConnector::new().with_target(PRIMARY, cluster_view("hpc-mgmt-2", "1000", "960"));

        let err = detector()
            .detect_failover(
                guard,
                &MockLifecycleAction::disconnecting(),
                &connector,
                &FailoverPlan::reboot(PRIMARY),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ValidatorError::FailoverDidNotRevert { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_with_restore() {
        let (guard, _) = session(PRIMARY, cluster_view("hpc-mgmt-1", "1000", "900"));
        let connector = MockConnector::new()
            .with_target(ALTERNATE, cluster_view("hpc-mgmt-2", "1050", "950"))
            .with_target(PRIMARY, cluster_view("hpc-mgmt-1", "1100", "1200"));
        let action = MockLifecycleAction::disconnecting();
        let plan = FailoverPlan::shutdown(PRIMARY, vec![ALTERNATE.to_string()]).with_restore(true);

        let report = detector()
            .detect_failover(guard, &action, &connector, &plan)
            .await
            .unwrap();

        let restored = report.restored.expect("restored snapshot");
        assert_eq!(restored.master_name, "hpc-mgmt-1");
        assert_eq!(restored.captured_at, 3);
        assert_eq!(action.starts(), vec!["hpc-mgmt-1".to_string()]);
        assert_eq!(report.log_checks.len(), 2);
        assert_eq!(
            report.log_checks[1].path,
            "/mnt/lsf/log/hpc-mgmt-1/mbatchd.log.hpc-mgmt-1"
        );
        assert_eq!((report.log_checks[1].before, report.log_checks[1].after), (950, 1200));
        assert!(report.elapsed >= Duration::from_secs(180));
        assert_eq!(
            connector.attempts(),
            vec![ALTERNATE.to_string(), PRIMARY.to_string()]
        );
        assert_eq!(connector.closed_sessions(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_without_revert() {
        let (guard, _) = session(PRIMARY, cluster_view("hpc-mgmt-1", "1000", "900"));
        let connector = MockConnector::new()
            .with_target(ALTERNATE, cluster_view("hpc-mgmt-2", "1050", "950"))
            .with_target(PRIMARY, cluster_view("hpc-mgmt-2", "1100", "1200"));
        let plan = FailoverPlan::shutdown(PRIMARY, vec![ALTERNATE.to_string()]).with_restore(true);

        let err = detector()
            .detect_failover(guard, &MockLifecycleAction::disconnecting(), &connector, &plan)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ValidatorError::FailoverDidNotRevert { ref expected, ref actual }
                if expected == "hpc-mgmt-1" && actual == "hpc-mgmt-2"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_start_failure_propagates() {
        let (guard, _) = session(PRIMARY, cluster_view("hpc-mgmt-1", "1000", "900"));
        let connector = MockConnector::new()
            .with_target(ALTERNATE, cluster_view("hpc-mgmt-2", "1050", "950"));
        let action = MockLifecycleAction::disconnecting()
            .with_start_reply(Reply::Fail("instance not found".to_string()));
        let plan = FailoverPlan::shutdown(PRIMARY, vec![ALTERNATE.to_string()]).with_restore(true);

        let err = detector()
            .detect_failover(guard, &action, &connector, &plan)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(connector.attempts(), vec![ALTERNATE.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_requires_standby_node() {
        let single = ScriptedExecutor::new()
            .on_output("lsid", lsid_output("hpc-mgmt-1"))
            .on_output(
                "bhosts -w -noheader",
                BhostsOutputBuilder::new()
                    .without_header()
                    .host("hpc-mgmt-1", "ok")
                    .build(),
            );
        let (guard, closes) = session(PRIMARY, single);
        let action = MockLifecycleAction::disconnecting();
        let plan = FailoverPlan::shutdown(PRIMARY, vec![ALTERNATE.to_string()]);

        let err = detector()
            .detect_failover(guard, &action, &MockConnector::new(), &plan)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(action.stops().is_empty());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_baseline_parse_failure_releases_session() {
        let broken = ScriptedExecutor::new().on_output("lsid", "lsid: command not found");
        let (guard, closes) = session(PRIMARY, broken);

        let err = detector()
            .detect_failover(
                guard,
                &MockLifecycleAction::disconnecting(),
                &MockConnector::new(),
                &FailoverPlan::reboot(PRIMARY),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
