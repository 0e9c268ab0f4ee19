//! HTTP-level tests for the TelcoX API
//!
//! Every test runs the real handlers against the in-memory store.

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use telcox_api::{configure_routes, json_config};
    use telcox_core::{
        config::UsageConfig,
        models::{
            Billing, BillingPayment, Consumption, ConsumptionType, Customer, CustomerService,
            Service, Status,
        },
        FixedClock,
    };
    use telcox_db::{MemoryStore, Repositories};
    use telcox_services::{IncrementSource, RealtimeService, ScriptedSource, UsageService};

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        ))
    }

    fn record(customer_id: &str, kind: ConsumptionType, used: Decimal, total: Decimal) -> Consumption {
        Consumption {
            customer_id: customer_id.to_string(),
            kind,
            used,
            total,
            unit: kind.default_unit().to_string(),
            percentage: Consumption::compute_percentage(used, total),
            reset_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            ..Default::default()
        }
    }

    /// CUST001 with a full account, CUST002 with nothing attached
    async fn seeded_repos() -> Repositories {
        let repos = Repositories::in_memory(Arc::new(MemoryStore::new()));

        for id in ["CUST001", "CUST002"] {
            repos
                .customers
                .create(&Customer {
                    id: id.to_string(),
                    name: format!("Customer {}", id),
                    email: Some(format!("{}@telcox.test", id.to_lowercase())),
                    plan: Some("Premium".to_string()),
                    status: Status::Active,
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        for seed in [
            record("CUST001", ConsumptionType::Data, dec!(1.0), dec!(5.0)),
            record("CUST001", ConsumptionType::Minutes, dec!(100), dec!(500)),
            record("CUST001", ConsumptionType::Sms, dec!(10), dec!(100)),
        ] {
            repos.consumptions.create(&seed).await.unwrap();
        }

        let billing = repos
            .billings
            .create(&Billing {
                customer_id: "CUST001".to_string(),
                current_balance: Some(dec!(45.50)),
                currency: None,
                next_bill_date: NaiveDate::from_ymd_opt(2024, 2, 1),
                monthly_fee: Some(dec!(29.99)),
                ..Default::default()
            })
            .await
            .unwrap();

        for (day, amount) in [(1, dec!(29.99)), (10, dec!(15.00))] {
            repos
                .payments
                .create(&BillingPayment {
                    billing_id: billing.id,
                    amount,
                    payment_date: NaiveDate::from_ymd_opt(2024, 1, day),
                    method: Some("card".to_string()),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        repos
            .services
            .create(&Service {
                id: "SRV001".to_string(),
                name: "Roaming".to_string(),
                description: Some("EU roaming".to_string()),
                status: Status::Active,
            })
            .await
            .unwrap();
        repos
            .customer_services
            .create(&CustomerService {
                customer_id: "CUST001".to_string(),
                service_id: "SRV001".to_string(),
            })
            .await
            .unwrap();

        repos
    }

    macro_rules! test_app {
        ($repos:expr, $source:expr) => {{
            let repos: Repositories = $repos;
            let source: Box<dyn IncrementSource> = Box::new($source);
            let usage = UsageService::new(&repos, clock(), source, UsageConfig::default());
            let realtime = RealtimeService::new(&repos, clock());
            test::init_service(
                App::new()
                    .app_data(web::Data::new(repos))
                    .app_data(web::Data::new(usage))
                    .app_data(web::Data::new(realtime))
                    .app_data(json_config())
                    .configure(configure_routes),
            )
            .await
        }};
    }

    fn approx(value: &Value, expected: f64) -> bool {
        value
            .as_f64()
            .map(|v| (v - expected).abs() < 1e-9)
            .unwrap_or(false)
    }

    #[actix_web::test]
    async fn test_health_reports_backend() {
        let app = test_app!(seeded_repos().await, ScriptedSource::default());

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "TelcoX Backend");
        assert_eq!(body["database"], "memory");
        assert!(body["timestamp"].as_str().is_some());
    }

    #[actix_web::test]
    async fn test_realtime_full_account() {
        let app = test_app!(seeded_repos().await, ScriptedSource::default());

        let req = test::TestRequest::get()
            .uri("/api/customer/CUST001/realtime")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["timestamp"], "2024-01-15T10:00:00+00:00");
        assert_eq!(body["customer"]["id"], "CUST001");
        assert_eq!(body["customer"]["status"], "active");

        let data = &body["consumption"]["data"];
        assert!(approx(&data["used"], 1.0));
        assert!(approx(&data["total"], 5.0));
        assert!(approx(&data["percentage"], 20.0));
        assert_eq!(data["unit"], "GB");
        assert_eq!(data["reset_date"], "2024-02-01");
        assert_eq!(body["consumption"]["minutes"]["unit"], "min");

        let billing = &body["billing"];
        assert!(approx(&billing["current_balance"], 45.5));
        assert_eq!(billing["currency"], "EUR");
        assert_eq!(billing["next_bill_date"], "2024-02-01");
        assert!(approx(&billing["last_payment"]["amount"], 15.0));
        assert_eq!(billing["last_payment"]["date"], "2024-01-10");

        assert_eq!(body["services"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["services"][0]["name"], "Roaming");
    }

    #[actix_web::test]
    async fn test_realtime_defaults_for_empty_account() {
        let app = test_app!(seeded_repos().await, ScriptedSource::default());

        let req = test::TestRequest::get()
            .uri("/api/customer/CUST002/realtime")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let sms = &body["consumption"]["sms"];
        assert!(approx(&sms["used"], 0.0));
        assert_eq!(sms["unit"], "SMS");
        assert_eq!(sms["reset_date"], "");
        assert_eq!(body["billing"]["currency"], "EUR");
        assert!(body["billing"]["last_payment"].is_null());
        assert_eq!(body["services"], json!([]));
    }

    #[actix_web::test]
    async fn test_realtime_unknown_customer() {
        let app = test_app!(seeded_repos().await, ScriptedSource::default());

        let req = test::TestRequest::get()
            .uri("/api/customer/NOPE/realtime")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Customer not found" }));
    }

    #[actix_web::test]
    async fn test_simulate_usage_then_realtime() {
        let app = test_app!(seeded_repos().await, ScriptedSource::new([25, 7, 2]));

        let req = test::TestRequest::post()
            .uri("/api/customer/CUST001/simulate-usage")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Usage simulated successfully");
        assert_eq!(
            body["updates"],
            json!(["Data: +0.25GB", "Minutes: +7min", "SMS: +2"])
        );
        assert_eq!(body["timestamp"], "2024-01-15T10:00:00+00:00");

        let req = test::TestRequest::get()
            .uri("/api/customer/CUST001/realtime")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(approx(&body["consumption"]["data"]["used"], 1.25));
        assert!(approx(&body["consumption"]["data"]["percentage"], 25.0));
        assert!(approx(&body["consumption"]["minutes"]["used"], 107.0));
        assert!(approx(&body["consumption"]["minutes"]["percentage"], 21.4));
        assert!(approx(&body["consumption"]["sms"]["used"], 12.0));
    }

    #[actix_web::test]
    async fn test_simulate_usage_without_records() {
        let app = test_app!(seeded_repos().await, ScriptedSource::new([25]));

        let req = test::TestRequest::post()
            .uri("/api/customer/CUST002/simulate-usage")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["updates"], json!([]));
    }

    #[actix_web::test]
    async fn test_simulate_usage_unknown_customer() {
        let app = test_app!(seeded_repos().await, ScriptedSource::new([25]));

        let req = test::TestRequest::post()
            .uri("/api/customer/NOPE/simulate-usage")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_reset_consumption() {
        let app = test_app!(seeded_repos().await, ScriptedSource::default());

        let req = test::TestRequest::post()
            .uri("/api/customer/CUST001/reset-consumption")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Consumption reset successfully");

        let req = test::TestRequest::get()
            .uri("/api/customer/CUST001/realtime")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        for kind in ["data", "minutes", "sms"] {
            let summary = &body["consumption"][kind];
            assert!(approx(&summary["used"], 0.0), "{} not reset", kind);
            assert!(approx(&summary["percentage"], 0.0));
            assert_eq!(summary["reset_date"], "2024-02-14");
        }
    }

    #[actix_web::test]
    async fn test_list_page_far_past_the_end() {
        let app = test_app!(seeded_repos().await, ScriptedSource::default());

        let req = test::TestRequest::get()
            .uri("/customers?page=9223372036854775807&per_page=1000")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!([]));

        let req = test::TestRequest::get()
            .uri("/customers?page=0")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_customer_crud() {
        let app = test_app!(seeded_repos().await, ScriptedSource::default());

        let req = test::TestRequest::post()
            .uri("/customers")
            .set_json(json!({
                "id": "CUST010",
                "name": "New Customer",
                "email": "new@telcox.test",
                "plan": "Basic"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "message": "Customer created" }));

        let req = test::TestRequest::put()
            .uri("/customers/CUST010")
            .set_json(json!({ "plan": "Premium", "status": "inactive" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "message": "Customer updated" }));

        let req = test::TestRequest::get().uri("/customers/CUST010").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["name"], "New Customer");
        assert_eq!(body["plan"], "Premium");
        assert_eq!(body["status"], "inactive");

        let req = test::TestRequest::get().uri("/customers").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(Vec::len), Some(3));

        let req = test::TestRequest::delete()
            .uri("/customers/CUST010")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "message": "Customer deleted" }));

        let req = test::TestRequest::get().uri("/customers/CUST010").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_customer_create_rejects_bad_input() {
        let app = test_app!(seeded_repos().await, ScriptedSource::default());

        // missing name
        let req = test::TestRequest::post()
            .uri("/customers")
            .set_json(json!({ "id": "CUST011" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().is_some());

        let req = test::TestRequest::post()
            .uri("/customers")
            .set_json(json!({ "id": "CUST011", "name": "X", "email": "not-an-email" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/customers")
            .set_json(json!({ "id": "CUST001", "name": "Duplicate" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_consumption_update_recomputes_percentage() {
        let app = test_app!(seeded_repos().await, ScriptedSource::default());

        let req = test::TestRequest::put()
            .uri("/consumptions/1")
            .set_json(json!({ "used": 2.5 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "message": "Consumption updated" }));

        let req = test::TestRequest::get().uri("/consumptions/1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["type"], "data");
        assert!(approx(&body["used"], 2.5));
        assert!(approx(&body["percentage"], 50.0));
    }

    #[actix_web::test]
    async fn test_consumption_create_and_errors() {
        let app = test_app!(seeded_repos().await, ScriptedSource::default());

        let req = test::TestRequest::post()
            .uri("/consumptions")
            .set_json(json!({ "customer_id": "CUST002", "type": "sms", "total": 200 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        // second SMS record for the same customer
        let req = test::TestRequest::post()
            .uri("/consumptions")
            .set_json(json!({ "customer_id": "CUST002", "type": "sms", "total": 50 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri("/consumptions")
            .set_json(json!({ "customer_id": "CUST002", "type": "fax", "total": 50 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/consumptions/999").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Consumption not found" }));
    }

    #[actix_web::test]
    async fn test_consumption_used_above_total_is_rejected() {
        let app = test_app!(seeded_repos().await, ScriptedSource::new([5]));

        let req = test::TestRequest::post()
            .uri("/consumptions")
            .set_json(json!({
                "customer_id": "CUST002",
                "type": "minutes",
                "used": 600,
                "total": 500
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().is_some());

        // Record 2 is CUST001 minutes at 100/500
        let req = test::TestRequest::put()
            .uri("/consumptions/2")
            .set_json(json!({ "used": 600 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri("/consumptions/2")
            .set_json(json!({ "total": 50 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/consumptions/2").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(approx(&body["used"], 100.0));
        assert!(approx(&body["total"], 500.0));

        // Usage only grows from the stored value
        let req = test::TestRequest::post()
            .uri("/api/customer/CUST001/simulate-usage")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/consumptions/2").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(approx(&body["used"], 105.0));
    }

    #[actix_web::test]
    async fn test_billing_and_payment_endpoints() {
        let app = test_app!(seeded_repos().await, ScriptedSource::default());

        let req = test::TestRequest::post()
            .uri("/billings")
            .set_json(json!({
                "customer_id": "CUST002",
                "current_balance": 0,
                "currency": "USD",
                "monthly_fee": 9.99
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/billings/2").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["customer_id"], "CUST002");
        assert_eq!(body["currency"], "USD");

        let req = test::TestRequest::post()
            .uri("/billing_payments")
            .set_json(json!({
                "billing_id": 2,
                "amount": 9.99,
                "payment_date": "2024-01-12",
                "method": "transfer"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/billing_payments").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(Vec::len), Some(3));

        let req = test::TestRequest::delete()
            .uri("/billing_payments/42")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Payment not found" }));
    }

    #[actix_web::test]
    async fn test_service_assignment_endpoints() {
        let app = test_app!(seeded_repos().await, ScriptedSource::default());

        let req = test::TestRequest::post()
            .uri("/customer_services")
            .set_json(json!({ "customer_id": "CUST002", "service_id": "SRV001" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "message": "Service assigned to customer" }));

        let req = test::TestRequest::get().uri("/customer_services").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(Vec::len), Some(2));

        let req = test::TestRequest::delete()
            .uri("/customer_services/CUST002/SRV001")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "message": "Service unassigned from customer" }));

        let req = test::TestRequest::delete()
            .uri("/customer_services/CUST002/SRV001")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "CustomerService not found" }));
    }

    #[actix_web::test]
    async fn test_customer_delete_cascades_to_realtime() {
        let app = test_app!(seeded_repos().await, ScriptedSource::default());

        let req = test::TestRequest::delete()
            .uri("/customers/CUST001")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/consumptions").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!([]));

        let req = test::TestRequest::get()
            .uri("/api/customer/CUST001/realtime")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
