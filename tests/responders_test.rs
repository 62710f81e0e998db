mod helpers;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use vigil::analysis::InputKind;
use vigil::config::ResponderConfig;
use vigil::decision::classify::Action;
use vigil::responders::{EventLogResponder, Responder, ResponderSet};

#[tokio::test]
async fn event_log_sees_every_decision() {
    let tmp = tempfile::TempDir::new().unwrap();
    let db_path = tmp.path().join("events.db");
    let log = Arc::new(EventLogResponder::open(&db_path).unwrap());
    let set = ResponderSet::new(vec![log.clone() as Arc<dyn Responder>], Duration::from_secs(5));

    let agent = helpers::test_agent(helpers::test_store(30));
    for score in [85u8, 45, 10] {
        let record = agent.decide(InputKind::Url, &[json!({"risk_score": score})]).await;
        for handle in set.dispatch(&record) {
            handle.await.unwrap();
        }
    }

    let rows = log.recent(10).unwrap();
    assert_eq!(rows.len(), 3);
    let mut actions: Vec<&str> = rows.iter().map(|r| r.action.as_str()).collect();
    actions.sort();
    assert_eq!(actions, vec!["alert", "ignore", "log"]);
}

#[tokio::test]
async fn unreachable_webhook_never_affects_the_decision() {
    let config = ResponderConfig {
        // port 9 (discard) is closed on test machines
        n8n_webhook_url: Some("http://127.0.0.1:9/webhook".into()),
        slack_webhook_url: None,
        events_db_path: None,
        timeout_ms: 500,
    };
    let set = ResponderSet::from_config(&config).unwrap();
    assert_eq!(set.len(), 1);

    let memory = helpers::test_store(30);
    let agent = helpers::test_agent(memory.clone());
    let record = agent.decide(InputKind::Url, &[json!({"risk_score": 95})]).await;
    assert_eq!(record.action(), Action::Alert);
    assert_eq!(memory.stats().total_events, 1);

    for handle in set.dispatch(&record) {
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }
}

#[test]
fn bad_webhook_url_is_a_config_error() {
    let config = ResponderConfig {
        slack_webhook_url: Some("::not a url::".into()),
        ..Default::default()
    };
    assert!(ResponderSet::from_config(&config).is_err());
}
