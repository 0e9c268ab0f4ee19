//! Integration tests for the background auto-updater

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::time::Duration;
    use telcox_core::{
        models::{Consumption, ConsumptionType, Customer, Status},
        traits::Repository,
        AppError, FixedClock,
    };
    use telcox_db::{MemoryStore, Repositories};
    use telcox_services::{AutoUpdater, IncrementSource, ScriptedSource};
    use tokio_util::sync::CancellationToken;

    /// Panics on its first `panics` draws, then draws the top of the range
    struct PanickingSource {
        panics: usize,
    }

    impl IncrementSource for PanickingSource {
        fn next_in_range(&mut self, _low: i64, high: i64) -> i64 {
            if self.panics > 0 {
                self.panics -= 1;
                panic!("increment source failed");
            }
            high
        }
    }

    fn record(customer_id: &str, kind: ConsumptionType, used: Decimal, total: Decimal) -> Consumption {
        Consumption {
            customer_id: customer_id.to_string(),
            kind,
            used,
            total,
            unit: kind.default_unit().to_string(),
            percentage: Consumption::compute_percentage(used, total),
            ..Default::default()
        }
    }

    /// CUST001 active, CUST002 inactive, CUST003 active but capped on minutes
    async fn seeded_store() -> (Arc<MemoryStore>, Repositories) {
        let store = Arc::new(MemoryStore::new());
        let repos = Repositories::in_memory(store.clone());

        for (id, status) in [
            ("CUST001", Status::Active),
            ("CUST002", Status::Inactive),
            ("CUST003", Status::Active),
        ] {
            repos
                .customers
                .create(&Customer {
                    id: id.to_string(),
                    name: id.to_string(),
                    status,
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        for seed in [
            record("CUST001", ConsumptionType::Data, dec!(1.0), dec!(5.0)),
            record("CUST001", ConsumptionType::Minutes, dec!(100), dec!(500)),
            record("CUST001", ConsumptionType::Sms, dec!(10), dec!(100)),
            record("CUST002", ConsumptionType::Minutes, dec!(10), dec!(500)),
            record("CUST003", ConsumptionType::Minutes, dec!(500), dec!(500)),
        ] {
            repos.consumptions.create(&seed).await.unwrap();
        }

        (store, repos)
    }

    /// Updater drawing the top of every trickle range
    fn updater(repos: &Repositories) -> AutoUpdater {
        AutoUpdater::new(
            repos,
            Arc::new(FixedClock(Utc::now())),
            Box::new(ScriptedSource::new([i64::MAX])),
            Duration::from_secs(30),
        )
    }

    async fn snapshot(repos: &Repositories) -> Vec<Consumption> {
        repos.consumptions.find_all(100, 0).await.unwrap()
    }

    #[tokio::test]
    async fn test_pass_updates_active_uncapped_records() {
        let (_store, repos) = seeded_store().await;
        let mut updater = updater(&repos);

        let report = updater.run_pass().await.unwrap();
        assert_eq!(report.pass, 1);
        assert_eq!(report.customers_scanned, 2);
        assert_eq!(report.records_examined, 4);
        assert_eq!(report.records_updated, 3);

        let after = snapshot(&repos).await;
        assert_eq!(after[0].used, dec!(1.050));
        assert_eq!(after[0].percentage, Some(dec!(21.0)));
        assert_eq!(after[1].used, dec!(103));
        assert_eq!(after[2].used, dec!(11));

        // Inactive customer untouched
        assert_eq!(after[3].used, dec!(10));
        assert_eq!(after[3].version, 0);

        // Capped record untouched
        assert_eq!(after[4].used, dec!(500));
        assert_eq!(after[4].version, 0);
    }

    #[tokio::test]
    async fn test_zero_draws_are_not_written() {
        let (_store, repos) = seeded_store().await;
        let mut updater = AutoUpdater::new(
            &repos,
            Arc::new(FixedClock(Utc::now())),
            Box::new(ScriptedSource::new([0])),
            Duration::from_secs(30),
        );

        let report = updater.run_pass().await.unwrap();
        // Data and minutes have positive minimums, the SMS draw of zero is skipped
        assert_eq!(report.records_updated, 2);

        let after = snapshot(&repos).await;
        assert_eq!(after[2].used, dec!(10));
        assert_eq!(after[2].version, 0);
    }

    #[tokio::test]
    async fn test_failed_pass_leaves_records_untouched() {
        let (store, repos) = seeded_store().await;
        let before = snapshot(&repos).await;
        let mut updater = updater(&repos);

        store.set_fail_commits(true);
        let err = updater.run_pass().await.unwrap_err();
        assert!(matches!(err, AppError::BackgroundPass { pass: 1, .. }));
        assert_eq!(snapshot(&repos).await, before);

        store.set_fail_commits(false);
        let report = updater.run_pass().await.unwrap();
        assert_eq!(report.pass, 2);
        assert_eq!(report.records_updated, 3);
        assert_eq!(updater.passes(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_pass() {
        let (store, repos) = seeded_store().await;
        let mut updater = updater(&repos);

        store.set_unavailable(true);
        let err = updater.run_pass().await.unwrap_err();
        assert!(matches!(err, AppError::BackgroundPass { pass: 1, .. }));
        store.set_unavailable(false);

        assert_eq!(snapshot(&repos).await[0].used, dec!(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_runs_immediately_and_on_interval() {
        let (_store, repos) = seeded_store().await;
        let handle = updater(&repos).spawn(CancellationToken::new());

        // Passes at t=0, 30 and 60
        tokio::time::sleep(Duration::from_secs(61)).await;
        let passes = handle.shutdown().await.unwrap();
        assert_eq!(passes, 3);

        let after = snapshot(&repos).await;
        assert_eq!(after[1].used, dec!(109));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_survives_failing_passes() {
        let (store, repos) = seeded_store().await;
        let before = snapshot(&repos).await;

        store.set_fail_commits(true);
        let handle = updater(&repos).spawn(CancellationToken::new());

        // Passes at t=0 and t=30 both fail
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(snapshot(&repos).await, before);

        // Next pass at t=60 succeeds
        store.set_fail_commits(false);
        tokio::time::sleep(Duration::from_secs(30)).await;

        let passes = handle.shutdown().await.unwrap();
        assert_eq!(passes, 3);
        assert_eq!(snapshot(&repos).await[1].used, dec!(103));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_survives_panicking_pass() {
        let (_store, repos) = seeded_store().await;
        let before = snapshot(&repos).await;

        let handle = AutoUpdater::new(
            &repos,
            Arc::new(FixedClock(Utc::now())),
            Box::new(PanickingSource { panics: 1 }),
            Duration::from_secs(30),
        )
        .spawn(CancellationToken::new());

        // Pass at t=0 panics mid-pass and writes nothing
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(snapshot(&repos).await, before);

        // Passes at t=30 and t=60 succeed
        tokio::time::sleep(Duration::from_secs(60)).await;

        let passes = handle.shutdown().await.unwrap();
        assert_eq!(passes, 3);
        assert_eq!(snapshot(&repos).await[1].used, dec!(106));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_survives_record_at_decimal_max() {
        let (_store, repos) = seeded_store().await;
        repos
            .consumptions
            .create(&record(
                "CUST003",
                ConsumptionType::Data,
                Decimal::MAX - dec!(1),
                Decimal::MAX,
            ))
            .await
            .unwrap();

        let handle = updater(&repos).spawn(CancellationToken::new());
        tokio::time::sleep(Duration::from_secs(31)).await;

        let passes = handle.shutdown().await.unwrap();
        assert_eq!(passes, 2);

        let after = snapshot(&repos).await;
        let extreme = after.last().unwrap();
        assert!(extreme.used <= extreme.total);
        assert_eq!(extreme.percentage, Some(dec!(100.0)));
        assert_eq!(after[1].used, dec!(106));
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_cancellation_stops_loop() {
        let (_store, repos) = seeded_store().await;
        let token = CancellationToken::new();
        let handle = updater(&repos).spawn(token.clone());

        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
        assert!(handle.cancel_token().is_cancelled());

        let passes = handle.shutdown().await.unwrap();
        assert_eq!(passes, 1);
    }
}
