//! # Integration Tests
//!
//! End-to-end tests over the full dispatch pipeline, no provider needed:
//! plan -> engine -> mock sender -> store, plus crash-recovery replay.

#[cfg(test)]
mod support {
    use contracts::Recipient;

    pub fn recipients(n: usize) -> Vec<Recipient> {
        (0..n)
            .map(|i| Recipient {
                id: format!("assoc-{i}"),
                name: format!("Associado {i}"),
                whatsapp: format!("+55119999{i:0>4}"),
                plan: Some(if i % 2 == 0 { "Mensal" } else { "Premium" }.into()),
                email: Some(format!("a{i}@exemplo.com")),
            })
            .collect()
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use batch_store::MemoryBatchStore;
    use contracts::{
        AttemptStatus, BatchStatus, BatchStore, EngineConfig, JitterConfig, MessageTemplate,
        PersistRetryConfig, SendFailure, TemplateSpec,
    };
    use dispatch_engine::senders::MockSender;
    use dispatch_engine::{DispatchEngine, DispatchRequest};
    use rate_limiter::HourlyRateLimiter;

    use crate::support::recipients;

    fn fast_engine_config() -> EngineConfig {
        EngineConfig {
            hourly_limit: 10_000,
            jitter: JitterConfig::none(),
            persist_retry: PersistRetryConfig {
                max_attempts: 2,
                backoff_ms: 1,
            },
        }
    }

    fn templates() -> Vec<MessageTemplate> {
        vec![MessageTemplate {
            id: "boas_vindas".into(),
            name: "Boas-vindas".into(),
            body: "Olá {{nome}}! Seu plano {{plano}} está ativo. ({{data}})".into(),
        }]
    }

    /// End-to-end: plan template -> engine -> sender -> store history
    #[tokio::test]
    async fn test_e2e_campaign_history_and_stats() {
        let sender = Arc::new(MockSender::new());
        let store = Arc::new(MemoryBatchStore::new());
        let limiter = Arc::new(HourlyRateLimiter::new(100));
        let engine = DispatchEngine::new(
            Arc::clone(&sender),
            Arc::clone(&store),
            Arc::clone(&limiter),
            fast_engine_config(),
            templates(),
        );

        let handle = engine
            .dispatch(
                DispatchRequest::new(recipients(4), TemplateSpec::template("boas_vindas"))
                    .with_filters(serde_json::json!({ "plano": "todos" })),
            )
            .await
            .unwrap();

        let outcome = handle.wait().await.unwrap();
        assert_eq!(outcome.status, BatchStatus::Completed);
        assert_eq!(outcome.sent, 4);

        // History query: one batch, newest first, settled counters
        let batches = store.list_batches().await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].sent + batches[0].failed, 4);
        assert!(batches[0].is_settled());
        assert_eq!(
            batches[0].filters_used,
            Some(serde_json::json!({ "plano": "todos" }))
        );

        // Recent attempts query, newest first
        let recent = store.list_recent_attempts(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].recipient_name, "Associado 3");

        // Bodies actually rendered per recipient
        let delivered = sender.sent_messages();
        assert!(delivered[0].body.starts_with("Olá Associado 0! Seu plano Mensal"));
        assert!(delivered[1].body.contains("Premium"));

        // Stats reflect consumption
        let snapshot = engine.stats_reporter().current();
        assert_eq!(snapshot.sent, 4);
        assert_eq!(snapshot.limit, 100);
        assert!(snapshot.reset_in > Duration::ZERO);
    }

    /// Partial failure isolation across the whole pipeline
    #[tokio::test]
    async fn test_e2e_partial_failures_do_not_abort() {
        let mut fail = HashMap::new();
        fail.insert(
            "+551199990002".to_string(),
            SendFailure::invalid_recipient("not on whatsapp"),
        );
        let sender = Arc::new(MockSender::failing(fail));
        let store = Arc::new(MemoryBatchStore::new());
        let engine = DispatchEngine::new(
            sender,
            Arc::clone(&store),
            Arc::new(HourlyRateLimiter::new(100)),
            fast_engine_config(),
            vec![],
        );

        let outcome = engine
            .dispatch(DispatchRequest::new(
                recipients(5),
                TemplateSpec::inline("oi {{nome}}"),
            ))
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();

        assert_eq!(outcome.status, BatchStatus::Completed);
        assert_eq!(outcome.sent, 4);
        assert_eq!(outcome.failed, 1);

        let attempts = store.list_attempts(outcome.batch_id).await.unwrap();
        assert_eq!(attempts.len(), 5);
        let failed: Vec<_> = attempts
            .iter()
            .filter(|a| a.status == AttemptStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].whatsapp, "+551199990002");
        assert_eq!(
            failed[0].failure.as_ref().unwrap().kind,
            contracts::FailureKind::InvalidRecipient
        );
    }

    /// Cancellation stops at the recipient boundary, leaving no trace of
    /// the recipients that were never reached
    #[tokio::test]
    async fn test_e2e_cancellation_boundary() {
        let sender = Arc::new(MockSender::new());
        let store = Arc::new(MemoryBatchStore::new());
        let engine = DispatchEngine::new(
            Arc::clone(&sender),
            Arc::clone(&store),
            Arc::new(HourlyRateLimiter::new(100)),
            EngineConfig {
                hourly_limit: 100,
                // Long enough that the cancel always lands inside it
                jitter: JitterConfig {
                    min_ms: 400,
                    max_ms: 400,
                },
                persist_retry: PersistRetryConfig::default(),
            },
            vec![],
        );
        let mut events = sender.subscribe();

        let handle = engine
            .dispatch(DispatchRequest::new(recipients(5), TemplateSpec::inline("oi")))
            .await
            .unwrap();
        let batch_id = handle.batch_id();

        // Let exactly two sends happen, then cancel during the jitter
        events.recv().await.unwrap();
        events.recv().await.unwrap();
        handle.cancel();

        let outcome = handle.wait().await.unwrap();
        assert_eq!(outcome.status, BatchStatus::Cancelled);
        assert_eq!(outcome.sent, 2);

        let attempts = store.list_attempts(batch_id).await.unwrap();
        assert_eq!(attempts.len(), 2);
        assert!(attempts.iter().all(|a| a.status == AttemptStatus::Sent));

        let batch = store.get_batch(batch_id).await.unwrap();
        assert_eq!(batch.status, BatchStatus::Cancelled);
        assert_eq!(batch.sent + batch.failed, 2);
    }

    /// Two batches running concurrently share the one rate window
    #[tokio::test(start_paused = true)]
    async fn test_e2e_concurrent_batches_share_limiter() {
        let sender = Arc::new(MockSender::new());
        let store = Arc::new(MemoryBatchStore::new());
        let limiter = Arc::new(HourlyRateLimiter::with_window(4, Duration::from_secs(60)));
        let engine = DispatchEngine::new(
            Arc::clone(&sender),
            Arc::clone(&store),
            Arc::clone(&limiter),
            EngineConfig {
                hourly_limit: 4,
                jitter: JitterConfig::none(),
                persist_retry: PersistRetryConfig::default(),
            },
            vec![],
        );

        let first = engine
            .dispatch(DispatchRequest::new(
                recipients(3),
                TemplateSpec::inline("lote um"),
            ))
            .await
            .unwrap();
        let second = engine
            .dispatch(DispatchRequest::new(
                recipients(3),
                TemplateSpec::inline("lote dois"),
            ))
            .await
            .unwrap();

        let first_outcome = first.wait().await.unwrap();
        let second_outcome = second.wait().await.unwrap();

        // Both complete: the shared ceiling delays the overflow into the
        // next window instead of dropping it
        assert_eq!(first_outcome.status, BatchStatus::Completed);
        assert_eq!(second_outcome.status, BatchStatus::Completed);
        assert_eq!(first_outcome.sent + second_outcome.sent, 6);
        assert_eq!(sender.sent_count(), 6);

        // The window never holds more than the ceiling
        assert!(engine.stats_reporter().current().sent <= 4);
    }

    /// Crash recovery: scan finds the interrupted batch, resume finishes
    /// it, and replaying counter increments does not double-count
    #[tokio::test]
    async fn test_e2e_recovery_resume_and_idempotent_replay() {
        use contracts::{AttemptOutcome, NewAttempt, NewBatch};

        let store = Arc::new(MemoryBatchStore::new());
        let all = recipients(5);

        // A previous process created the batch, attempted 2 recipients,
        // then died before its terminal transition
        let batch = store
            .create_batch(NewBatch {
                template_id: None,
                body: "oi {{nome}}".into(),
                total_recipients: 5,
                filters_used: None,
            })
            .await
            .unwrap();
        store
            .update_batch_status(batch.id, BatchStatus::InProgress)
            .await
            .unwrap();

        let mut counted = Vec::new();
        for recipient in all.iter().take(2) {
            let attempt = store
                .create_attempt(NewAttempt::for_batch(
                    batch.id,
                    recipient,
                    format!("oi {}", recipient.name),
                    None,
                ))
                .await
                .unwrap();
            store
                .resolve_attempt(attempt.id, AttemptOutcome::Sent)
                .await
                .unwrap();
            store
                .increment_counters(batch.id, attempt.id, AttemptOutcome::Sent)
                .await
                .unwrap();
            counted.push(attempt.id);
        }

        // Startup: recovery scan points at the first unattempted recipient
        let points = batch_store::scan_interrupted(store.as_ref()).await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].next_index, 2);

        // Recovery replay re-applies increments for already-counted
        // attempts; idempotency keeps the aggregates honest
        for id in &counted {
            store
                .increment_counters(batch.id, *id, AttemptOutcome::Sent)
                .await
                .unwrap();
        }

        let sender = Arc::new(MockSender::new());
        let engine = DispatchEngine::new(
            Arc::clone(&sender),
            Arc::clone(&store),
            Arc::new(HourlyRateLimiter::new(100)),
            fast_engine_config(),
            vec![],
        );

        let outcome = engine
            .resume(points[0].batch.id, all, HashMap::new())
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();

        assert_eq!(outcome.status, BatchStatus::Completed);
        assert_eq!(outcome.sent, 5);
        assert_eq!(outcome.failed, 0);

        // Only the unattempted tail was sent by this process
        assert_eq!(sender.sent_count(), 3);
        assert_eq!(store.list_attempts(batch.id).await.unwrap().len(), 5);
    }

    /// Ad-hoc sends appear in history without a batch and share the window
    #[tokio::test]
    async fn test_e2e_ad_hoc_send_alongside_batch() {
        let sender = Arc::new(MockSender::new());
        let store = Arc::new(MemoryBatchStore::new());
        let engine = DispatchEngine::new(
            Arc::clone(&sender),
            Arc::clone(&store),
            Arc::new(HourlyRateLimiter::new(100)),
            fast_engine_config(),
            templates(),
        );

        let all = recipients(3);
        engine
            .dispatch(DispatchRequest::new(
                all[..2].to_vec(),
                TemplateSpec::inline("oi {{nome}}"),
            ))
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();

        let ad_hoc = engine
            .send_one(&all[2], TemplateSpec::template("boas_vindas"), HashMap::new())
            .await
            .unwrap();

        assert_eq!(ad_hoc.status, AttemptStatus::Sent);
        assert!(ad_hoc.batch_id.is_none());

        // Three attempts total in the history, one outside any batch
        let recent = store.list_recent_attempts(10).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].batch_id, None);

        // All three consumed the shared window
        assert_eq!(engine.stats_reporter().current().sent, 3);
    }
}

#[cfg(test)]
mod plan_tests {
    use config_loader::{ConfigFormat, ConfigLoader};

    /// The plan drives the whole pipeline configuration
    #[test]
    fn test_plan_to_engine_settings() {
        let plan = ConfigLoader::load_from_str(
            r#"
[engine]
hourly_limit = 42

[engine.jitter]
min_ms = 100
max_ms = 200

[[templates]]
id = "aviso"
name = "Aviso"
body = "Atenção {{nome}}: {{data}}"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        assert_eq!(plan.engine.hourly_limit, 42);
        assert_eq!(plan.engine.jitter.min_ms, 100);
        assert!(plan.find_template("aviso").is_some());
    }

    /// A plan template renders end to end, unknown tokens fail open
    #[test]
    fn test_plan_template_renders() {
        let plan = ConfigLoader::load_from_str(
            r#"
[[templates]]
id = "aviso"
name = "Aviso"
body = "Atenção {{nome}}: consulta em {{data}} {{sala}}"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let recipient = crate::support::recipients(1).remove(0);
        let vars = renderer::recipient_vars(&recipient, &Default::default(), "07/08/2026");
        let body = renderer::render(&plan.find_template("aviso").unwrap().body, &vars);
        assert_eq!(
            body,
            "Atenção Associado 0: consulta em 07/08/2026 {{sala}}"
        );
    }
}
