use axum::http::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_health_root() {
    let app = common::create_test_app().await;

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_health_live() {
    let app = common::create_test_app().await;

    let (status, body) = app.get("/health/live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime"].is_u64());
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let app = common::create_test_app().await;

    let (status, body) = app.get("/api/nowhere").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_catalog_lists_courses_in_order() {
    let app = common::create_test_app().await;

    let (status, body) = app.get("/api/catalog").await;

    assert_eq!(status, StatusCode::OK);
    let courses = body["data"].as_array().unwrap();
    assert_eq!(courses.len(), 8);
    assert_eq!(courses[0]["name"], "Computer Science");
    assert_eq!(courses[0]["topics"][0]["name"], "Python Basics");
    assert_eq!(courses[0]["topics"][0]["difficulty"], 1);
    assert_eq!(courses[0]["topics"][1]["prerequisites"], json!(["Python Basics"]));

    let genetics = courses[4]["topics"][1].clone();
    assert_eq!(genetics["name"], "Genetics");
    assert_eq!(genetics["difficulty"], 3);
    assert_eq!(genetics["estimatedMinutes"], 120);
}

#[tokio::test]
async fn test_learning_path_orders_prerequisites_first() {
    let app = common::create_test_app().await;

    let (status, body) = app.get("/api/catalog/topics/Neural%20Networks/path").await;

    assert_eq!(status, StatusCode::OK);
    let topics: Vec<&str> = body["data"]["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["topic"].as_str().unwrap())
        .collect();
    assert_eq!(
        topics,
        [
            "Python Basics",
            "Statistics",
            "Supervised Learning",
            "Linear Algebra",
            "Neural Networks"
        ]
    );
    assert_eq!(body["data"]["steps"][2]["course"], "Machine Learning");
    assert_eq!(body["data"]["totalMinutes"], 780);
}

#[tokio::test]
async fn test_learning_path_unknown_topic() {
    let app = common::create_test_app().await;

    let (status, body) = app.get("/api/catalog/topics/Alchemy/path").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_baseline_recommendations_for_new_learner() {
    let app = common::create_test_app().await;

    let (status, body) = app.get("/api/users/newcomer/recommendations").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["userId"], "newcomer");
    assert_eq!(body["data"]["method"], "baseline");

    let recs = body["data"]["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 5);
    assert_eq!(recs[0]["topic"], "Calculus");
    assert!(recs.iter().all(|r| r["prereqsMet"] == true));
    assert!(recs.iter().all(|r| r["targetMastery"] == 70.0));
    assert!(recs.iter().all(|r| r.get("hybridScore").is_none()));
}

#[tokio::test]
async fn test_recommendations_respect_top_k() {
    let app = common::create_test_app().await;

    let (status, body) = app.get("/api/users/newcomer/recommendations?topK=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["recommendations"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_hybrid_falls_back_to_baseline_on_cold_start() {
    let app = common::create_test_app().await;

    let (status, body) = app
        .get("/api/users/newcomer/recommendations?method=hybrid")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["method"], "baseline");
    assert_eq!(body["data"]["recommendations"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_hybrid_recommendations_with_peer_history() {
    let app = common::create_test_app().await;
    app.seed("alice", "Mathematics", "Calculus", 80.0).await;
    app.seed("alice", "Mathematics", "Statistics", 60.0).await;
    app.seed("bob", "Mathematics", "Calculus", 70.0).await;
    app.seed("bob", "Mathematics", "Linear Algebra", 90.0).await;
    app.seed("carol", "Mathematics", "Statistics", 50.0).await;
    app.seed("carol", "Mathematics", "Discrete Mathematics", 40.0).await;

    let (status, body) = app
        .get("/api/users/alice/recommendations?method=hybrid&topK=3&cfWeight=0.5")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["method"], "hybrid");
    let recs = body["data"]["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 3);
    for rec in recs {
        let hybrid = rec["hybridScore"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&hybrid));
        assert!(rec["cfScore"].is_number());
        assert!(rec["normalizedBaselineScore"].is_number());
    }
}

#[tokio::test]
async fn test_invalid_cf_weight_is_rejected() {
    let app = common::create_test_app().await;

    let (status, body) = app
        .get("/api/users/alice/recommendations?method=hybrid&cfWeight=1.5")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_zero_top_k_is_rejected() {
    let app = common::create_test_app().await;

    let (status, body) = app.get("/api/users/alice/recommendations?topK=0").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_method_is_rejected() {
    let app = common::create_test_app().await;

    let (status, body) = app
        .get("/api/users/alice/recommendations?method=magic")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_update_progress_clamps_and_summarises() {
    let app = common::create_test_app().await;

    let (status, body) = app
        .send_json(
            "PUT",
            "/api/users/dana/progress",
            json!({"course": "Computer Science", "topic": "Python Basics", "masteryLevel": 150.0}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["masteryLevel"], 100.0);

    app.send_json(
        "PUT",
        "/api/users/dana/progress",
        json!({"course": "Computer Science", "topic": "Data Structures", "masteryLevel": 50.0}),
    )
    .await;

    let (status, body) = app.get("/api/users/dana/progress").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["records"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["courseAverages"]["Computer Science"], 75.0);
}

#[tokio::test]
async fn test_mastered_topic_leaves_recommendations() {
    let app = common::create_test_app().await;
    app.seed("erin", "Mathematics", "Calculus", 96.0).await;

    let (_, body) = app
        .get("/api/users/erin/recommendations?topK=50")
        .await;

    let recs = body["data"]["recommendations"].as_array().unwrap();
    assert!(recs.iter().all(|r| r["topic"] != "Calculus"));
    assert_eq!(recs.len(), 30);
}

#[tokio::test]
async fn test_fully_mastered_learner_gets_empty_list() {
    let app = common::create_test_app().await;
    let pairs: Vec<(String, String)> = app
        .service
        .catalog()
        .iter_topics()
        .map(|(c, t)| (c.to_string(), t.to_string()))
        .collect();
    assert_eq!(pairs.len(), 31);
    for (course, topic) in &pairs {
        app.seed("hana", course, topic, 100.0).await;
    }

    for uri in [
        "/api/users/hana/recommendations",
        "/api/users/hana/recommendations?method=hybrid",
    ] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["recommendations"], json!([]));
    }
}

#[tokio::test]
async fn test_topic_progress_defaults_to_zero() {
    let app = common::create_test_app().await;

    let (status, body) = app
        .get("/api/users/frank/progress/Physics/Thermodynamics")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["masteryLevel"], 0.0);
}

#[tokio::test]
async fn test_update_progress_rejects_unlisted_pair() {
    let app = common::create_test_app().await;

    let (status, _) = app
        .send_json(
            "PUT",
            "/api/users/dana/progress",
            json!({"course": "Cooking", "topic": "Python Basics", "masteryLevel": 10.0}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send_json(
            "PUT",
            "/api/users/dana/progress",
            json!({"course": "Physics", "topic": "Python Basics", "masteryLevel": 10.0}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_progress_rejects_malformed_body() {
    let app = common::create_test_app().await;

    let (status, body) = app
        .send_json(
            "PUT",
            "/api/users/dana/progress",
            json!({"course": "Physics", "topic": "Thermodynamics"}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_record_feedback() {
    let app = common::create_test_app().await;

    let (status, body) = app
        .send_json(
            "POST",
            "/api/users/gale/feedback",
            json!({"topic": "Genetics", "feedback": "snooze"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["kind"], "snooze");
    assert_eq!(body["data"]["topic"], "Genetics");

    let stored = app.service.store().list_feedback("gale").await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_record_feedback_validation() {
    let app = common::create_test_app().await;

    let (status, _) = app
        .send_json(
            "POST",
            "/api/users/gale/feedback",
            json!({"topic": "Genetics", "feedback": "like"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send_json(
            "POST",
            "/api/users/gale/feedback",
            json!({"topic": "Alchemy", "feedback": "start"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
