//! HTTP surface tests driven through the router with `oneshot`

mod helpers;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use bpa_ai::{build_router, AppState};
use bpa_ai::types::CompletionError;
use helpers::*;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn post(state: &AppState, uri: &str, body: Value) -> (StatusCode, Value) {
    send(build_router(state.clone()), "POST", uri, Some(body)).await
}

/// State whose completion service answers assessment prompts
fn scripted_state() -> AppState {
    app_state(ScriptedCompletion::new(assessment_responder), FakeBrowser::new(), None)
}

fn clinic_body() -> Value {
    json!({ "answers": clinic_answers() })
}

#[tokio::test]
async fn test_health_reports_configuration() {
    let app = build_router(app_state(ScriptedCompletion::unconfigured(), FakeBrowser::new(), None));
    let (status, body) = send(app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["module"], "bpa-ai");
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["completionConfigured"], false);
    assert_eq!(body["searchConfigured"], false);
    assert!(body["uptimeSeconds"].is_u64());
}

#[tokio::test]
async fn test_analyze_standard() {
    let app = build_router(app_state(
        ScriptedCompletion::new(assessment_responder),
        FakeBrowser::new(),
        None,
    ));
    let (status, body) = send(app, "POST", "/api/analyze-businessplan", Some(clinic_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 68);
    assert_eq!(body["subscriptionLevel"], "standard");
    assert!(body.get("premiumAnalysis").is_none());
    assert!(body["feedback"]["company_value"].is_string());
    assert_eq!(body["provisional"], false);
}

#[tokio::test]
async fn test_analyze_with_unavailable_service_returns_fallback() {
    let app = build_router(app_state(ScriptedCompletion::unavailable(), FakeBrowser::new(), None));
    let (status, body) = send(app, "POST", "/api/analyze-businessplan", Some(clinic_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 75);
    assert_eq!(body["provisional"], true);
    assert!(body["feedback"].as_object().map(|f| !f.is_empty()).unwrap_or(false));
}

#[tokio::test]
async fn test_analyze_without_credential_is_503() {
    let app = build_router(app_state(ScriptedCompletion::unconfigured(), FakeBrowser::new(), None));
    let (status, body) = send(app, "POST", "/api/analyze-businessplan", Some(clinic_body())).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_analyze_rejected_is_502_with_correlation_id() {
    let completion = ScriptedCompletion::new(|_| {
        Err(CompletionError::Rejected("quota exceeded for org-secret".to_string()))
    });
    let state = app_state(completion, FakeBrowser::new(), None);
    let app = build_router(state.clone());
    let (status, body) = send(app, "POST", "/api/analyze-businessplan", Some(clinic_body())).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "UPSTREAM_REJECTED");
    assert!(body["error"]["correlation_id"].is_string());
    assert!(!body.to_string().contains("org-secret"));
    assert!(state.last_error.read().await.is_some());
}

#[tokio::test]
async fn test_analyze_without_answers_is_400() {
    let body = json!({ "answers": {} });
    let (status, body) = post(&scripted_state(), "/api/analyze-businessplan", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let body = json!({ "answers": "nope" });
    let (status, body) = post(&scripted_state(), "/api/analyze-businessplan", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_analyze_with_existing_analysis_upgrades_only() {
    let completion = ScriptedCompletion::new(assessment_responder);
    let state = app_state(completion.clone(), FakeBrowser::new(), None);

    let (_, standard) = post(&state, "/api/analyze-businessplan", clinic_body()).await;
    let body = json!({
        "answers": clinic_answers(),
        "isPremium": true,
        "existingAnalysis": standard
    });
    let (status, premium) = post(&state, "/api/analyze-businessplan", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(premium["subscriptionLevel"], "premium");
    assert_eq!(premium["premiumAnalysis"]["dealReadyScore"], 71);
    for field in ["score", "scoreBreakdown", "feedback", "actionItems"] {
        assert_eq!(premium[field], standard[field], "field {} changed", field);
    }
    assert_eq!(completion.call_count(), 2);
}

#[tokio::test]
async fn test_analyze_with_competitors() {
    let completion = ScriptedCompletion::new(|prompt| {
        if prompt.user_message.starts_with("Name up to") {
            Ok(r#"[{"name": "Doctolib", "url": "https://doctolib.example"}]"#.to_string())
        } else if prompt.user_message.starts_with("Competitor: ") {
            Ok(r#"{"offeringSummary": "Online booking"}"#.to_string())
        } else {
            assessment_responder(prompt)
        }
    });
    let browser =
        FakeBrowser::new().with_page("doctolib.example", &page("Doctolib", "Book online"));
    let app = build_router(app_state(completion, browser, None));

    let (status, body) = send(
        app,
        "POST",
        "/api/analyze-businessplan",
        Some(json!({ "answers": clinic_answers(), "includeCompetitors": true })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 68);
    assert_eq!(body["competitors"][0]["name"], "Doctolib");
    assert_eq!(body["competitors"][0]["offeringSummary"], "Online booking");
}

#[tokio::test]
async fn test_premium_by_stored_id() {
    let state = scripted_state();

    let (_, standard) = post(&state, "/api/analyze-businessplan", clinic_body()).await;
    let (status, saved) = post(&state, "/api/analyses", standard.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["id"], standard["id"]);

    let (status, premium) = send(
        build_router(state.clone()),
        "POST",
        "/api/generate-premium-analysis",
        Some(json!({ "analysisId": standard["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(premium["subscriptionLevel"], "premium");
    assert_eq!(premium["score"], standard["score"]);

    let uri = format!("/api/analyses/{}", standard["id"].as_str().unwrap());
    let (status, stored) = send(build_router(state), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["subscriptionLevel"], "premium");
}

#[tokio::test]
async fn test_premium_without_source_is_400() {
    let (status, _) = post(&scripted_state(), "/api/generate-premium-analysis", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_analysis_is_404() {
    let app = build_router(scripted_state());
    let uri = format!("/api/analyses/{}", uuid::Uuid::new_v4());
    let (status, body) = send(app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_scrape_website() {
    let browser = FakeBrowser::new()
        .with_page("rival.example", &page("Rival", "Online booking for dentists"));
    let state = app_state(ScriptedCompletion::new(assessment_responder), browser, None);

    let body = json!({ "url": "rival.example" });
    let (status, body) = post(&state, "/api/scrape-website", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Rival");
    assert_eq!(body["description"], "Online booking for dentists");
    assert!(body["visibleText"].as_str().unwrap().contains("Online booking"));
}

#[tokio::test]
async fn test_scrape_errors_map_to_status() {
    let state = scripted_state();

    let (status, _) = post(&state, "/api/scrape-website", json!({ "url": "ftp://x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({ "url": "gone.example" });
    let (status, body) = post(&state, "/api/scrape-website", body).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_competitor_suggest() {
    let completion = ScriptedCompletion::always(r#"["Doctolib", "Muntra"]"#);
    let search = FakeSearch {
        names: vec!["Bokadirekt".to_string()],
    };
    let app = build_router(app_state(completion, FakeBrowser::new(), Some(search)));

    let (status, body) = send(app, "POST", "/api/competitor-suggest", Some(clinic_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestions"], json!(["Doctolib", "Muntra", "Bokadirekt"]));
}

#[tokio::test]
async fn test_analyze_competitors_endpoint() {
    let completion = ScriptedCompletion::always(r#"[{"name": "Doctolib"}]"#);
    let app = build_router(app_state(completion, FakeBrowser::new(), None));

    let (status, body) = send(app, "POST", "/api/analyze-competitors", Some(clinic_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["competitors"], json!([{ "name": "Doctolib" }]));
}

#[tokio::test]
async fn test_section_feedback() {
    let app = build_router(app_state(
        ScriptedCompletion::always("Strong problem. Add numbers. Interview five clinics."),
        FakeBrowser::new(),
        None,
    ));
    let (status, body) = send(
        app,
        "POST",
        "/api/section-feedback",
        Some(json!({ "section": "customer_problem", "text": "Clinics book by phone" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feedback"], "Strong problem. Add numbers. Interview five clinics.");
}

#[tokio::test]
async fn test_section_feedback_requires_text() {
    let app = build_router(app_state(ScriptedCompletion::always("ok"), FakeBrowser::new(), None));
    let body = json!({ "section": "team" });
    let (status, _) = send(app, "POST", "/api/section-feedback", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ai_suggest_drafts_answer_from_website() {
    let completion = ScriptedCompletion::new(|prompt| {
        assert!(prompt.user_message.contains("Online booking for dental clinics"));
        Ok("Dental clinics lose hours every week to phone booking.".to_string())
    });
    let browser = FakeBrowser::new().with_page(
        "clinicflow.example",
        &page("ClinicFlow", "Online booking for dental clinics"),
    );
    let app = build_router(app_state(completion, browser, None));
    let (status, body) = send(
        app,
        "POST",
        "/api/ai-suggest",
        Some(json!({
            "questionId": "customer_problem",
            "questionText": "What problem do your customers have?",
            "websiteUrl": "clinicflow.example"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestion"], "Dental clinics lose hours every week to phone booking.");
    assert!(body.get("suggestions").is_none());
}

#[tokio::test]
async fn test_ai_suggest_without_website_returns_two_questions() {
    let completion = ScriptedCompletion::always(r#"["How many clinics?"]"#);
    let app = build_router(app_state(completion, FakeBrowser::new(), None));
    let (status, body) = send(
        app,
        "POST",
        "/api/ai-suggest",
        Some(json!({
            "questionId": "customer_problem",
            "questionText": "What problem do your customers have?",
            "currentAnswer": "Booking is slow"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0], "How many clinics?");
}

#[tokio::test]
async fn test_overall_summary() {
    let completion = ScriptedCompletion::always("Clear niche. Thin traction. Run a pilot.");
    let app = build_router(app_state(completion, FakeBrowser::new(), None));
    let (status, body) = send(app, "POST", "/api/overall-summary", Some(clinic_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Clear niche. Thin traction. Run a pilot.");
}

#[tokio::test]
async fn test_overall_summary_requires_answers() {
    let app = build_router(app_state(ScriptedCompletion::always("ok"), FakeBrowser::new(), None));
    let (status, _) = send(app, "POST", "/api/overall-summary", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_market_estimate_uses_static_tables_by_default() {
    let completion = ScriptedCompletion::always("unused");
    let app = build_router(app_state(completion.clone(), FakeBrowser::new(), None));
    let (status, body) = send(
        app,
        "POST",
        "/api/market-estimate",
        Some(json!({ "industry": "Fintech", "region": "Europa" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["benchmarks"]["averageCac"], 800.0);
    assert_eq!(body["marketData"]["source"], "McKinsey Fintech Report 2024");
    assert!(body["estimate"].as_str().unwrap().starts_with("Market size:"));
    assert_eq!(completion.call_count(), 0);
}
