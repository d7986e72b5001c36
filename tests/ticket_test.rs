mod common;

use serde_json::{json, Value};

fn history_actions(body: &Value) -> Vec<(String, String, String)> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            (
                h["action"].as_str().unwrap().to_string(),
                h["old_value"].as_str().unwrap_or_default().to_string(),
                h["new_value"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn ticket_lifecycle_end_to_end() {
    let app = common::spawn_app().await;
    let admin = common::create_admin(&app).await;
    let agent = common::create_agent(&app).await;
    let end_user = common::create_end_user(&app).await;
    let taxonomy = common::seed_taxonomy(&app, &admin.token).await;

    // (a) END_USER files a ticket
    let ticket_id = common::create_ticket(&app, &end_user.token, &taxonomy, "HIGH").await;

    let (status, body) = app.get(&format!("/tickets/{}", ticket_id), &end_user.token).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "OPEN");
    assert_eq!(body["data"]["created_by"], end_user.id);
    assert_eq!(body["data"]["subcategory_name"], "Laptop");
    let fields = body["data"]["custom_fields"].as_array().unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0]["field_key"], "operating_system");
    assert_eq!(fields[0]["value_text"], "Windows");
    assert_eq!(fields[0]["value"], "Windows");

    // (b) AGENT takes it
    let (status, body) = app
        .patch(
            &format!("/tickets/{}", ticket_id),
            &agent.token,
            json!({ "status": "IN_PROGRESS", "assignee_id": agent.id }),
        )
        .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["status"], "IN_PROGRESS");
    assert_eq!(body["data"]["assignee_id"], agent.id);

    let (_, body) = app
        .get(&format!("/tickets/{}/history", ticket_id), &agent.token)
        .await;
    let history = history_actions(&body);
    assert_eq!(history.len(), 2);
    assert!(history.contains(&(
        "STATUS_CHANGE".to_string(),
        "OPEN".to_string(),
        "IN_PROGRESS".to_string()
    )));
    assert!(history.contains(&(
        "ASSIGNEE_CHANGE".to_string(),
        "null".to_string(),
        agent.id.to_string()
    )));

    // (c) AGENT resolves it
    let (status, body) = app
        .patch(
            &format!("/tickets/{}", ticket_id),
            &agent.token,
            json!({ "status": "RESOLVED", "resolution_note": "Reseated the battery" }),
        )
        .await;
    assert_eq!(status, 200, "{}", body);
    assert!(body["data"]["closed_at"].is_string());
    assert_eq!(body["data"]["resolution_note"], "Reseated the battery");

    let (_, body) = app
        .get(&format!("/tickets/{}/history", ticket_id), &agent.token)
        .await;
    let history = history_actions(&body);
    assert_eq!(history.len(), 3);
    assert_eq!(
        history[2],
        (
            "STATUS_CHANGE".to_string(),
            "IN_PROGRESS".to_string(),
            "RESOLVED".to_string()
        )
    );

    // (d) Report over today's tickets in this category
    let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let report_path = format!(
        "/stats/reports?start_date={today}&end_date={today}&category_id={}",
        taxonomy.category_id
    );
    let (status, body) = app.get(&report_path, &agent.token).await;
    assert_eq!(status, 200, "{}", body);
    let report = &body["data"];
    assert_eq!(report["summary"]["total_tickets"], 1);
    assert_eq!(report["summary"]["resolved_tickets"], 1);
    assert_eq!(report["operational_metrics"]["ever_resolved_tickets"], 1);
    assert_eq!(report["operational_metrics"]["reopened_tickets"], 0);
    assert_eq!(report["operational_metrics"]["reopened_rate_pct"], 0.0);

    // (e) Reopen
    let (status, body) = app
        .patch(
            &format!("/tickets/{}", ticket_id),
            &agent.token,
            json!({ "status": "OPEN" }),
        )
        .await;
    assert_eq!(status, 200);
    assert!(body["data"]["closed_at"].is_null());

    let (_, body) = app
        .get(&format!("/tickets/{}/history", ticket_id), &agent.token)
        .await;
    let history = history_actions(&body);
    assert_eq!(history.len(), 4);
    assert_eq!(history[3].1, "RESOLVED");
    assert_eq!(history[3].2, "OPEN");

    let (_, body) = app.get(&report_path, &agent.token).await;
    let metrics = &body["data"]["operational_metrics"];
    assert_eq!(metrics["reopened_tickets"], 1);
    assert_eq!(metrics["reopened_rate_pct"], 100.0);
}

#[tokio::test]
async fn update_without_changes_is_rejected() {
    let app = common::spawn_app().await;
    let admin = common::create_admin(&app).await;
    let agent = common::create_agent(&app).await;
    let taxonomy = common::seed_taxonomy(&app, &admin.token).await;
    let ticket_id = common::create_ticket(&app, &agent.token, &taxonomy, "LOW").await;

    let (status, body) = app
        .patch(
            &format!("/tickets/{}", ticket_id),
            &agent.token,
            json!({ "status": "OPEN", "assignee_id": null }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "NO_CHANGES");

    let (status, body) = app
        .patch(&format!("/tickets/{}", ticket_id), &agent.token, json!({}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "NO_CHANGES");

    let (_, body) = app
        .get(&format!("/tickets/{}/history", ticket_id), &agent.token)
        .await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn end_user_profile_overrides_submitted_caller() {
    let app = common::spawn_app().await;
    let admin = common::create_admin(&app).await;
    let end_user = common::create_end_user(&app).await;
    let taxonomy = common::seed_taxonomy(&app, &admin.token).await;

    let (status, body) = app
        .post(
            "/tickets",
            &end_user.token,
            json!({
                "caller_name": "Somebody Else",
                "department": "Legal",
                "description": "Screen flickers",
                "priority": "MEDIUM",
                "category_id": taxonomy.category_id,
                "subcategory_id": taxonomy.subcategory_id,
                "custom_fields": [
                    { "field_definition_id": taxonomy.os_field_id, "value": "Linux" }
                ]
            }),
        )
        .await;
    assert_eq!(status, 201, "{}", body);
    assert_eq!(body["data"]["caller_name"], end_user.name.as_str());
    assert_eq!(body["data"]["department"], "Finance");
    assert_eq!(body["data"]["created_by"], end_user.id);
    assert_eq!(body["data"]["status"], "OPEN");
}

#[tokio::test]
async fn staff_must_name_the_caller() {
    let app = common::spawn_app().await;
    let admin = common::create_admin(&app).await;
    let taxonomy = common::seed_taxonomy(&app, &admin.token).await;

    let (status, body) = app
        .post(
            "/tickets",
            &admin.token,
            json!({
                "description": "Printer jammed",
                "priority": "LOW",
                "category_id": taxonomy.category_id,
                "subcategory_id": taxonomy.subcategory_id,
                "custom_fields": [
                    { "field_definition_id": taxonomy.os_field_id, "value": "macOS" }
                ]
            }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn end_user_without_department_cannot_file() {
    let app = common::spawn_app().await;
    let admin = common::create_admin(&app).await;
    let end_user = common::create_user(&app, helpdesk::models::UserRole::EndUser, None).await;
    let taxonomy = common::seed_taxonomy(&app, &admin.token).await;

    let (status, body) = app
        .post(
            "/tickets",
            &end_user.token,
            json!({
                "description": "VPN drops",
                "priority": "LOW",
                "category_id": taxonomy.category_id,
                "subcategory_id": taxonomy.subcategory_id,
                "custom_fields": [
                    { "field_definition_id": taxonomy.os_field_id, "value": "Windows" }
                ]
            }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "MISSING_PROFILE_DATA");
}

#[tokio::test]
async fn custom_field_rules_are_enforced() {
    let app = common::spawn_app().await;
    let admin = common::create_admin(&app).await;
    let agent = common::create_agent(&app).await;
    let taxonomy = common::seed_taxonomy(&app, &admin.token).await;

    let base = |custom_fields: Value| {
        json!({
            "caller_name": "Walk-in Caller",
            "department": "Operations",
            "description": "Laptop will not boot",
            "priority": "HIGH",
            "category_id": taxonomy.category_id,
            "subcategory_id": taxonomy.subcategory_id,
            "custom_fields": custom_fields
        })
    };

    let (status, body) = app.post("/tickets", &agent.token, base(json!([]))).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "MISSING_REQUIRED_FIELD");

    let (status, body) = app
        .post(
            "/tickets",
            &agent.token,
            base(json!([{ "field_definition_id": taxonomy.os_field_id, "value": "   " }])),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "MISSING_REQUIRED_FIELD");

    let (status, body) = app
        .post(
            "/tickets",
            &agent.token,
            base(json!([{ "field_definition_id": taxonomy.os_field_id, "value": "BeOS" }])),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "INVALID_FIELD_VALUE");

    let (status, body) = app
        .post(
            "/tickets",
            &agent.token,
            base(json!([
                { "field_definition_id": taxonomy.os_field_id, "value": "Windows" },
                { "field_definition_id": 999_999, "value": "x" }
            ])),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "UNKNOWN_FIELD");

    let (status, body) = app
        .post(
            "/tickets",
            &agent.token,
            base(json!([
                { "field_definition_id": taxonomy.os_field_id, "value": "Windows" },
                { "field_definition_id": taxonomy.os_field_id, "value": "Linux" }
            ])),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "DUPLICATE_FIELD");

    // Nothing was written by the rejected attempts.
    let (_, body) = app
        .get("/tickets?assignee_id=unassigned&per_page=100", &agent.token)
        .await;
    let mine = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["category_id"] == taxonomy.category_id)
        .count();
    assert_eq!(mine, 0);
}

#[tokio::test]
async fn mismatched_or_inactive_taxonomy_is_rejected() {
    let app = common::spawn_app().await;
    let admin = common::create_admin(&app).await;
    let first = common::seed_taxonomy(&app, &admin.token).await;
    let second = common::seed_taxonomy(&app, &admin.token).await;

    let body = |category_id: i32, subcategory_id: i32| {
        json!({
            "caller_name": "Walk-in Caller",
            "department": "Operations",
            "description": "Dock not detected",
            "priority": "MEDIUM",
            "category_id": category_id,
            "subcategory_id": subcategory_id,
            "custom_fields": []
        })
    };

    let (status, resp) = app
        .post("/tickets", &admin.token, body(first.category_id, second.subcategory_id))
        .await;
    assert_eq!(status, 400);
    assert_eq!(resp["code"], "INVALID_SELECTION");

    let (status, _) = app
        .patch(
            &format!("/ticket-meta/subcategories/{}", second.subcategory_id),
            &admin.token,
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(status, 200);

    let (status, resp) = app
        .post("/tickets", &admin.token, body(second.category_id, second.subcategory_id))
        .await;
    assert_eq!(status, 400);
    assert_eq!(resp["code"], "INVALID_SELECTION");
}

#[tokio::test]
async fn end_users_only_see_their_own_tickets() {
    let app = common::spawn_app().await;
    let admin = common::create_admin(&app).await;
    let owner = common::create_end_user(&app).await;
    let other = common::create_end_user(&app).await;
    let taxonomy = common::seed_taxonomy(&app, &admin.token).await;

    let ticket_id = common::create_ticket(&app, &owner.token, &taxonomy, "MEDIUM").await;

    let (status, body) = app.get(&format!("/tickets/{}", ticket_id), &other.token).await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = app.get("/tickets", &other.token).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["total"], 0);

    let (_, body) = app.get("/tickets", &owner.token).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], ticket_id);

    let (status, _) = app.get("/tickets/999999", &owner.token).await;
    assert_eq!(status, 404);

    // Staff-only operations
    let (status, _) = app
        .patch(
            &format!("/tickets/{}", ticket_id),
            &owner.token,
            json!({ "status": "RESOLVED" }),
        )
        .await;
    assert_eq!(status, 403);
    let (status, _) = app
        .get(&format!("/tickets/{}/notes", ticket_id), &owner.token)
        .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn assignee_must_be_staff() {
    let app = common::spawn_app().await;
    let admin = common::create_admin(&app).await;
    let end_user = common::create_end_user(&app).await;
    let taxonomy = common::seed_taxonomy(&app, &admin.token).await;
    let ticket_id = common::create_ticket(&app, &admin.token, &taxonomy, "HIGH").await;

    let (status, body) = app
        .patch(
            &format!("/tickets/{}", ticket_id),
            &admin.token,
            json!({ "assignee_id": end_user.id }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "INVALID_ASSIGNEE");

    let (status, body) = app
        .patch(
            &format!("/tickets/{}", ticket_id),
            &admin.token,
            json!({ "assignee_id": 999_999 }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "INVALID_ASSIGNEE");
}

#[tokio::test]
async fn notes_are_listed_oldest_first() {
    let app = common::spawn_app().await;
    let admin = common::create_admin(&app).await;
    let agent = common::create_agent(&app).await;
    let taxonomy = common::seed_taxonomy(&app, &admin.token).await;
    let ticket_id = common::create_ticket(&app, &agent.token, &taxonomy, "MEDIUM").await;

    for note in ["Called the user", "Ordered a replacement"] {
        let (status, body) = app
            .post(
                &format!("/tickets/{}/notes", ticket_id),
                &agent.token,
                json!({ "note": note }),
            )
            .await;
        assert_eq!(status, 201, "{}", body);
        assert_eq!(body["data"]["author_name"], agent.name.as_str());
    }

    let (status, body) = app
        .get(&format!("/tickets/{}/notes", ticket_id), &admin.token)
        .await;
    assert_eq!(status, 200);
    let notes = body["data"].as_array().unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0]["note"], "Called the user");
    assert_eq!(notes[1]["note"], "Ordered a replacement");

    let (status, body) = app
        .post(
            &format!("/tickets/{}/notes", ticket_id),
            &agent.token,
            json!({ "note": "" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, _) = app
        .post("/tickets/999999/notes", &agent.token, json!({ "note": "hello" }))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn list_filters_and_priority_sort() {
    let app = common::spawn_app().await;
    let admin = common::create_admin(&app).await;
    let agent = common::create_agent(&app).await;
    let taxonomy = common::seed_taxonomy(&app, &admin.token).await;

    let low = common::create_ticket(&app, &agent.token, &taxonomy, "LOW").await;
    let high = common::create_ticket(&app, &agent.token, &taxonomy, "HIGH").await;
    let medium = common::create_ticket(&app, &agent.token, &taxonomy, "MEDIUM").await;

    let (status, _) = app
        .patch(
            &format!("/tickets/{}", medium),
            &agent.token,
            json!({ "assignee_id": agent.id }),
        )
        .await;
    assert_eq!(status, 200);

    let (status, body) = app
        .get(&format!("/tickets?assignee_id={}", agent.id), &agent.token)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], medium);
    assert_eq!(body["data"]["items"][0]["assignee_name"], agent.name.as_str());

    let (_, body) = app
        .get("/tickets?sort=priority&per_page=100", &agent.token)
        .await;
    let ordered: Vec<i64> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["category_id"] == taxonomy.category_id)
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ordered, vec![high as i64, medium as i64, low as i64]);

    let (status, body) = app.get("/tickets?status=CLOSED", &agent.token).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, body) = app.get("/tickets?assignee_id=someone", &agent.token).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn out_of_range_paging_is_a_validation_error() {
    let app = common::spawn_app().await;
    let agent = common::create_agent(&app).await;

    for page in ["18446744073709551615", "200000000000000000"] {
        let (status, body) = app
            .get(&format!("/tickets?page={}&per_page=100", page), &agent.token)
            .await;
        assert_eq!(status, 400, "{}", body);
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }

    let (status, body) = app.get("/tickets?page=abc", &agent.token).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, body) = app.get("/tickets?page=5000&per_page=100", &agent.token).await;
    assert_eq!(status, 200);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}
