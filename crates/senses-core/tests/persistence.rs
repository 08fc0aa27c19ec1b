//! Async persistence round-trips against the mock service.

use std::time::Duration;

use senses_core::{
    EditorSession, MockCall, MockPersistence, OpOutcome, PendingOp, PersistedConnection,
    PersistenceService, SenseEvent, sync,
};
use senses_types::{ConnectionGrant, ConnectionOrigin, LocationEntry, LocationSense, SenseId};
use time::OffsetDateTime;

fn grant(provider: &str, account: &str) -> ConnectionGrant {
    ConnectionGrant {
        provider_id: provider.to_string(),
        account_key: account.to_string(),
        display_name: None,
        device_info: None,
        connected_at: OffsetDateTime::now_utc(),
    }
}

#[tokio::test]
async fn test_connect_round_trip_supersedes_session_record() {
    let backend = MockPersistence::new();
    let mut session = EditorSession::default().with_persona_id("p-1");
    let fitness = SenseId::new("fitness");

    let op = session
        .connect(&fitness, grant("fitbit", "a@x.com"))
        .unwrap()
        .expect("session connection owes a create call");
    assert_eq!(
        session.connections().merged(&fitness)[0].origin,
        ConnectionOrigin::Session
    );

    let outcome = sync::execute(op, &backend).await;
    session.apply(outcome);

    let merged = session.connections().merged(&fitness);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].origin, ConnectionOrigin::Persisted);
    assert_eq!(merged[0].id, "conn-1");
    assert!(
        session
            .connections()
            .origin_list(&fitness, ConnectionOrigin::Session)
            .is_empty()
    );
}

#[tokio::test]
async fn test_failure_keeps_optimistic_state() {
    let backend = MockPersistence::new();
    backend.set_should_fail(true, Some("HTTP 503")).await;

    let mut session = EditorSession::default().with_persona_id("p-1");
    let mut events = session.subscribe();
    let fitness = SenseId::new("fitness");

    let op = session
        .connect(&fitness, grant("strava", "b@x.com"))
        .unwrap()
        .unwrap();
    session.apply(sync::execute(op, &backend).await);

    assert!(session.activation(&fitness).active);
    assert_eq!(session.sync_issues().len(), 1);
    assert!(session.sync_issues()[0].message.contains("HTTP 503"));

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if let SenseEvent::SyncFailed { operation, .. } = event {
            assert_eq!(operation, "create_connection");
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

#[tokio::test]
async fn test_disconnect_persisted_issues_delete() {
    let backend = MockPersistence::new();
    let fitness = SenseId::new("fitness");
    backend
        .seed_connection(PersistedConnection {
            id: "srv-1".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            provider: "fitbit".into(),
            sense_type: fitness.clone(),
            display_name: Some("Fitbit".into()),
            account_key: Some("a@x.com".into()),
            metadata: serde_json::Value::Null,
        })
        .await;

    let mut session = EditorSession::default().with_persona_id("p-1");
    let records: Vec<_> = backend
        .connections()
        .await
        .into_iter()
        .map(|r| r.into_connection().unwrap())
        .collect();
    session.load_persona(&Default::default(), records);
    assert!(session.activation(&fitness).active);

    let op = session.disconnect(&fitness, "srv-1").unwrap();
    assert!(!session.activation(&fitness).active);

    let outcome = sync::execute(op, &backend).await;
    assert!(matches!(outcome, OpOutcome::Deleted { .. }));
    session.apply(outcome);
    assert!(backend.connections().await.is_empty());
}

#[tokio::test]
async fn test_assign_persona_id_persists_fallback_records() {
    let backend = MockPersistence::new();
    let mut session = EditorSession::default();
    session
        .connect(&SenseId::new("fitness"), grant("fitbit", "a@x.com"))
        .unwrap();
    session
        .add_location(
            LocationSense::Weather,
            LocationEntry::specific(LocationSense::Weather, "Oslo", "NO", 59.91, 10.75),
        )
        .unwrap();

    let ops = session.assign_persona_id("p-7");
    assert_eq!(ops.len(), 2);

    for outcome in sync::execute_all(ops, &backend).await {
        session.apply(outcome);
    }

    assert!(session.sync_issues().is_empty());
    let saved = backend.persona("p-7").await.unwrap();
    assert_eq!(saved.weather_air_quality_configurations.len(), 1);
    assert_eq!(
        session.locations().persisted(LocationSense::Weather).len(),
        1
    );
    assert_eq!(
        session.connections().merged(&SenseId::new("fitness"))[0].origin,
        ConnectionOrigin::Persisted
    );
    assert!(matches!(
        backend.calls().await.as_slice(),
        [MockCall::CreateConnection { .. }, MockCall::UpdatePersona { .. }]
    ));
}

#[tokio::test]
async fn test_out_of_order_responses_merge_by_key() {
    let backend = MockPersistence::new();
    let mut session = EditorSession::default().with_persona_id("p-1");
    let fitness = SenseId::new("fitness");

    let first = session
        .connect(&fitness, grant("fitbit", "a@x.com"))
        .unwrap()
        .unwrap();
    let second = session
        .connect(&fitness, grant("strava", "b@x.com"))
        .unwrap()
        .unwrap();

    let second_outcome = sync::execute(second, &backend).await;
    let first_outcome = sync::execute(first, &backend).await;
    session.apply(second_outcome);
    session.apply(first_outcome);

    let merged = session.connections().merged(&fitness);
    assert_eq!(merged.len(), 2);
    assert!(merged.iter().all(|c| c.origin == ConnectionOrigin::Persisted));
}

#[tokio::test]
async fn test_late_create_after_disconnect_reappears() {
    // Last store mutation wins: nothing special-cases a create that lands
    // after the user already removed the session record.
    let backend = MockPersistence::new();
    let mut session = EditorSession::default().with_persona_id("p-1");
    let fitness = SenseId::new("fitness");

    let op = session
        .connect(&fitness, grant("fitbit", "a@x.com"))
        .unwrap()
        .unwrap();
    let PendingOp::CreateConnection { local_id, .. } = &op else {
        panic!("expected a create op");
    };
    assert!(session.disconnect(&fitness, local_id).is_none());
    assert!(!session.activation(&fitness).active);

    session.apply(sync::execute(op, &backend).await);
    assert!(session.activation(&fitness).active);
}

#[tokio::test]
async fn test_earlier_persona_echo_keeps_later_location() {
    let backend = MockPersistence::new();
    let mut session = EditorSession::default().with_persona_id("p-1");
    let weather = SenseId::new("weather");

    let toggle_op = session.toggle(&SenseId::new("battery"), true).unwrap();
    let location_op = session
        .add_location(
            LocationSense::Weather,
            LocationEntry::specific(LocationSense::Weather, "Paris", "FR", 48.8566, 2.3522),
        )
        .unwrap()
        .unwrap();

    session.apply(sync::execute(toggle_op, &backend).await);
    assert_eq!(session.locations().location_count(LocationSense::Weather), 1);

    backend.set_should_fail(true, Some("HTTP 500")).await;
    session.apply(sync::execute(location_op, &backend).await);

    assert_eq!(session.sync_issues().len(), 1);
    assert_eq!(session.locations().location_count(LocationSense::Weather), 1);
    assert!(session.activation(&weather).active);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_becomes_sync_issue() {
    let backend = MockPersistence::new();
    backend.set_latency(Duration::from_secs(60));

    let mut session = EditorSession::default().with_persona_id("p-1");
    let op = session.toggle(&SenseId::new("battery"), true).unwrap();

    let outcome = sync::execute_with_timeout(op, &backend, sync::DEFAULT_TIMEOUT).await;
    session.apply(outcome);

    assert_eq!(session.sync_issues().len(), 1);
    assert!(session.toggles().contains(&SenseId::new("battery")));
}

#[tokio::test]
async fn test_service_trait_object() {
    let backend: Box<dyn PersistenceService> = Box::new(MockPersistence::new());
    let session = EditorSession::default().with_persona_id("p-1");
    backend
        .update_persona("p-1", &session.persona_document())
        .await
        .unwrap();
}
