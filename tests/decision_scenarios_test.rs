mod helpers;

use serde_json::json;

use vigil::analysis::InputKind;
use vigil::decision::classify::Action;

#[tokio::test]
async fn malicious_url_alerts() {
    let agent = helpers::test_agent(helpers::test_store(30));
    let record = agent.decide(InputKind::Url, &[json!({"risk_score": 85})]).await;
    assert_eq!(record.combined_score(), 85);
    assert_eq!(record.action(), Action::Alert);
    assert!(record.reason().contains("85"));
}

#[tokio::test]
async fn middling_password_is_logged() {
    let agent = helpers::test_agent(helpers::test_store(30));
    let record = agent.decide(InputKind::Password, &[json!({"risk_score": 45})]).await;
    assert_eq!(record.combined_score(), 45);
    assert_eq!(record.action(), Action::Log);
}

#[tokio::test]
async fn benign_text_is_ignored() {
    let agent = helpers::test_agent(helpers::test_store(30));
    let record = agent.decide(InputKind::Text, &[json!({"risk_score": 10})]).await;
    assert_eq!(record.combined_score(), 10);
    assert_eq!(record.action(), Action::Ignore);
}

#[tokio::test]
async fn thirty_one_decisions_roll_the_ring() {
    let memory = helpers::test_store(30);
    let agent = helpers::test_agent(memory.clone());
    for score in 1..=31u8 {
        agent.decide(InputKind::Text, &[json!({"risk_score": score})]).await;
    }

    let recent = memory.recent_events(30);
    assert_eq!(recent.len(), 30);
    let oldest_first: Vec<u8> = recent.iter().rev().map(|e| e.record.combined_score()).collect();
    assert_eq!(oldest_first, (2..=31).collect::<Vec<u8>>());

    let stats = memory.stats();
    assert_eq!(stats.total_events, 31);
    assert!((stats.running_mean_score - 16.0).abs() < 1e-6);
    assert_eq!(stats.action_count(Action::Ignore), 29);
    assert_eq!(stats.action_count(Action::Log), 2);
}

#[tokio::test]
async fn boundaries_hold_through_the_agent() {
    let agent = helpers::test_agent(helpers::test_store(30));
    for (score, action) in [(71u8, Action::Alert), (70, Action::Log), (30, Action::Log), (29, Action::Ignore)] {
        let record = agent.decide(InputKind::Url, &[json!({"risk_score": score})]).await;
        assert_eq!(record.action(), action, "score {score}");
    }
}

#[tokio::test]
async fn garbage_analyzer_output_degrades_instead_of_failing() {
    let agent = helpers::test_agent(helpers::test_store(30));
    let record = agent
        .decide(
            InputKind::Url,
            &[json!({"risk_score": 90, "confidence": 0.9}), json!("timeout"), json!(null)],
        )
        .await;
    // degraded results carry the minimum weight, so the healthy one dominates
    assert!(record.combined_score() >= 80);
    assert_eq!(record.action(), Action::Alert);
    assert_eq!(record.analyzer_snapshot().iter().filter(|r| r.is_degraded()).count(), 2);
    assert!(record.reason().contains("unavailable"));
}

#[tokio::test]
async fn concurrent_decisions_are_all_counted() {
    let memory = helpers::test_store(30);
    let agent = helpers::test_agent(memory.clone());
    let tasks: Vec<_> = (0..50u8)
        .map(|i| {
            let agent = agent.clone();
            tokio::spawn(async move {
                agent.decide(InputKind::Text, &[json!({"risk_score": i * 2})]).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let stats = memory.stats();
    assert_eq!(stats.total_events, 50);
    assert_eq!(memory.len(), 30);
    // mean of 0, 2, ..., 98
    assert!((stats.running_mean_score - 49.0).abs() < 1e-6);
}
