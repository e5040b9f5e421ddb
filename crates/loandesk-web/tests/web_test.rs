//! Router tests against in-memory loan and payment backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal_macros::dec;
use tower::ServiceExt;

use loandesk_core::query::GraphQlError;
use loandesk_core::{
    CurrencyFormat, GatewayResponse, Loan, LoanPayment, LoanSource, LoansData, LoansResponse,
    PaymentGateway, PaymentRequest, TransportError,
};
use loandesk_web::{load_templates, router, AppState};

struct FakeLoans {
    response: Mutex<Result<LoansResponse, TransportError>>,
    calls: AtomicUsize,
}

impl FakeLoans {
    fn new(response: Result<LoansResponse, TransportError>) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(response),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LoanSource for FakeLoans {
    fn fetch_loans(&self) -> Result<LoansResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.lock().unwrap().clone()
    }
}

struct FakePayments {
    response: Result<GatewayResponse, TransportError>,
    delay: Duration,
    requests: Mutex<Vec<String>>,
}

impl FakePayments {
    fn new(response: Result<GatewayResponse, TransportError>) -> Arc<Self> {
        Self::slow(response, Duration::ZERO)
    }

    /// Answers only after `delay`, like a backend under load.
    fn slow(response: Result<GatewayResponse, TransportError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            response,
            delay,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl PaymentGateway for FakePayments {
    fn add_payment(&self, request: &PaymentRequest) -> Result<GatewayResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push(serde_json::to_string(request).unwrap());
        std::thread::sleep(self.delay);
        self.response.clone()
    }
}

fn loans() -> Vec<Loan> {
    vec![
        Loan {
            id: 1,
            name: "Alice Loan".to_string(),
            principal: dec!(10000),
            interest_rate: dec!(5.0),
            due_date: "2025-03-01".to_string(),
            status: None,
            loan_payments: Vec::new(),
        },
        Loan {
            id: 2,
            name: "Bob Loan".to_string(),
            principal: dec!(20000),
            interest_rate: dec!(10),
            due_date: "2025-03-01".to_string(),
            status: None,
            loan_payments: vec![LoanPayment {
                id: 7,
                loan_id: 2,
                payment_amount: Some(dec!(1500)),
                payment_date: Some("2025-03-04".to_string()),
                status: Some("On Time".to_string()),
            }],
        },
    ]
}

fn app_with(
    source: Arc<FakeLoans>,
    gateway: Arc<FakePayments>,
    dismiss_after: Duration,
) -> Router {
    let tera = load_templates(None).unwrap();
    let mut state = AppState::new(tera, source, gateway, CurrencyFormat::default());
    state.dismiss_after = dismiss_after;
    router(Arc::new(state))
}

fn app(source: Arc<FakeLoans>, gateway: Arc<FakePayments>) -> Router {
    app_with(source, gateway, Duration::from_secs(60))
}

fn added() -> Arc<FakePayments> {
    FakePayments::new(Ok(GatewayResponse::new(201, r#"{"id": 10}"#)))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn post(app: &Router, uri: &str, form: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_index_renders_shell_without_querying() {
    let source = FakeLoans::new(Ok(LoansResponse::with_loans(loans())));
    let app = app(source.clone(), added());

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Existing Loans &amp; Payments"));
    assert!(body.contains("Add New Payment"));
    assert!(body.contains("Loading loans &amp; payments..."));
    assert!(body.contains(r#"hx-get="/partials/loans""#));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_loan_list_renders_cards() {
    let source = FakeLoans::new(Ok(LoansResponse::with_loans(loans())));
    let app = app(source.clone(), added());

    let (status, body) = get(&app, "/partials/loans").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.matches(r#"class="card""#).count(), 2);
    assert!(body.contains("Alice Loan"));
    assert!(body.contains("Ksh\u{a0}10,000.00"));
    assert!(body.contains("5%"));
    assert!(body.contains("Ksh\u{a0}875.00"));
    assert!(body.contains("Unpaid"));
    assert!(body.contains("On Time"));
    assert!(body.contains("2025-03-04"));
    assert!(!body.contains("Loading loans"));
    assert_eq!(source.calls(), 1);

    // The query is only issued once.
    get(&app, "/partials/loans").await;
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_empty_list() {
    let source = FakeLoans::new(Ok(LoansResponse::with_loans(Vec::new())));
    let app = app(source, added());

    let (_, body) = get(&app, "/partials/loans").await;
    assert!(body.contains("No loans found"));
    assert!(!body.contains("Error loading data"));
}

#[tokio::test]
async fn test_transport_error_shows_banner_and_retry() {
    let source = FakeLoans::new(Err(TransportError::Status(500)));
    let app = app(source.clone(), added());

    let (_, body) = get(&app, "/partials/loans").await;
    assert!(body.contains("Error loading data"));
    assert!(body.contains("Response not successful: Received status code 500"));
    assert!(body.contains("Retry"));
    assert!(!body.contains("No loans found"));

    *source.response.lock().unwrap() = Ok(LoansResponse::with_loans(loans()));
    let response = post(&app, "/partials/loans/refetch", "").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(!body.contains("Error loading data"));
    assert!(body.contains("Alice Loan"));
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_partial_data_renders_with_errors() {
    let response = LoansResponse {
        data: Some(LoansData {
            loans: Some(loans()[..1].to_vec()),
        }),
        errors: vec![GraphQlError {
            message: "loan 2 unavailable".to_string(),
        }],
    };
    let app = app(FakeLoans::new(Ok(response)), added());

    let (_, body) = get(&app, "/partials/loans").await;
    assert!(body.contains("Error loading data"));
    assert!(body.contains("loan 2 unavailable"));
    assert!(body.contains("Alice Loan"));
    assert!(!body.contains("Bob Loan"));
}

#[tokio::test]
async fn test_selecting_loan_fills_amount() {
    let app = app(FakeLoans::new(Ok(LoansResponse::with_loans(loans()))), added());
    get(&app, "/partials/loans").await;

    let body = body_text(post(&app, "/payments/loan", "loan_id=1").await).await;
    assert!(body.contains(r#"value="875.00""#));
    assert!(body.contains(r#"<option value="1" selected>"#));

    let body = body_text(post(&app, "/payments/loan", "loan_id=").await).await;
    assert!(body.contains(r#"name="payment_amount" type="text""#));
    assert!(body.contains(r#"value="""#));
    assert!(!body.contains("875.00"));
}

#[tokio::test]
async fn test_submit_success_refreshes_loans() {
    let source = FakeLoans::new(Ok(LoansResponse::with_loans(loans())));
    let gateway = added();
    let app = app(source.clone(), gateway.clone());
    get(&app, "/partials/loans").await;

    post(&app, "/payments/loan", "loan_id=1").await;
    post(&app, "/payments/date", "payment_date=2025-03-04").await;
    let response = post(&app, "/payments", "").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("HX-Trigger").unwrap(),
        "loans-changed"
    );
    let body = body_text(response).await;
    assert!(body.contains("Payment added successfully!"));
    assert!(!body.contains("875.00"));

    let requests = gateway.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].contains(r#""loan_id":1"#));
    assert!(requests[0].contains(r#""payment_amount":875"#));
    assert!(requests[0].contains(r#""payment_date":"2025-03-04""#));

    // Initial load plus one refresh after the payment.
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_submit_field_errors() {
    let gateway = FakePayments::new(Ok(GatewayResponse::new(
        400,
        r#"{"error": {"payment_date": ["This field is required."]}}"#,
    )));
    let source = FakeLoans::new(Ok(LoansResponse::with_loans(loans())));
    let app = app(source.clone(), gateway);
    get(&app, "/partials/loans").await;
    post(&app, "/payments/loan", "loan_id=1").await;

    let response = post(&app, "/payments", "").await;
    assert!(response.headers().get("HX-Trigger").is_none());
    let body = body_text(response).await;
    assert!(body.contains("This field is required."));
    assert!(body.contains(r#"value="875.00""#));
    assert!(!body.contains("Payment added successfully!"));
    assert_eq!(source.calls(), 1);

    // Editing the date clears its error.
    let body = body_text(post(&app, "/payments/date", "payment_date=2025-03-04").await).await;
    assert!(!body.contains("This field is required."));
}

#[tokio::test]
async fn test_submit_general_error() {
    let gateway = FakePayments::new(Ok(GatewayResponse::new(
        500,
        r#"{"error": "Database error"}"#,
    )));
    let app = app(FakeLoans::new(Ok(LoansResponse::with_loans(loans()))), gateway);

    let body = body_text(post(&app, "/payments", "").await).await;
    assert!(body.contains("Database error"));
    assert!(body.contains("Add Payment"));
}

#[tokio::test]
async fn test_submit_transport_failure() {
    let gateway = FakePayments::new(Err(TransportError::Request(
        "connection refused".to_string(),
    )));
    let app = app(FakeLoans::new(Ok(LoansResponse::with_loans(loans()))), gateway);

    let body = body_text(post(&app, "/payments", "").await).await;
    assert!(body.contains("connection refused"));
}

#[tokio::test]
async fn test_success_message_is_dismissed() {
    let app = app_with(
        FakeLoans::new(Ok(LoansResponse::with_loans(loans()))),
        added(),
        Duration::from_millis(10),
    );
    get(&app, "/partials/loans").await;

    let body = body_text(post(&app, "/payments", "").await).await;
    assert!(body.contains("Payment added successfully!"));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let (_, body) = get(&app, "/partials/payment-form").await;
    assert!(!body.contains("Payment added successfully!"));
}

#[tokio::test]
async fn test_assets_are_served() {
    let app = app(FakeLoans::new(Ok(LoansResponse::with_loans(Vec::new()))), added());
    let (status, body) = get(&app, "/assets/app.css").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(".card"));
}

#[tokio::test]
async fn test_page_reload_starts_a_fresh_form() {
    let app = app(FakeLoans::new(Ok(LoansResponse::with_loans(loans()))), added());
    get(&app, "/partials/loans").await;
    post(&app, "/payments/loan", "loan_id=1").await;
    post(&app, "/payments/date", "payment_date=2025-03-04").await;

    let (_, body) = get(&app, "/").await;
    assert!(!body.contains(r#"value="875.00""#));
    assert!(!body.contains(r#"value="2025-03-04""#));
    assert!(!body.contains(r#"<option value="1" selected>"#));

    let (_, body) = get(&app, "/partials/payment-form").await;
    assert!(!body.contains(r#"value="875.00""#));
}

#[tokio::test]
async fn test_busy_states_are_driven_client_side() {
    let app = app(FakeLoans::new(Err(TransportError::Status(502))), added());

    let (_, page) = get(&app, "/").await;
    assert!(page.contains(r#"hx-disabled-elt="find button""#));
    assert!(page.contains(r##"hx-indicator="#payment-submit""##));
    assert!(page.contains(r#"id="payment-submit""#));
    assert!(page.contains(r#"<span class="htmx-indicator"><span class="spinner" aria-hidden="true"></span> Adding...</span>"#));
    assert!(page.contains(r#"id="loans-indicator" class="htmx-indicator loading""#));
    assert!(page.contains(r##"hx-indicator="#loans-indicator""##));
    assert!(page.contains(r#"data-phase="idle""#));

    let (_, list) = get(&app, "/partials/loans").await;
    assert!(list.contains("Retry"));
    assert!(list.contains(r##"hx-indicator="#loans-indicator""##));
    assert!(list.contains(r#"hx-disabled-elt="this""#));
}

#[tokio::test]
async fn test_form_phase_follows_submission() {
    let gateway = FakePayments::new(Ok(GatewayResponse::new(
        500,
        r#"{"error": "Database error"}"#,
    )));
    let app = app(FakeLoans::new(Ok(LoansResponse::with_loans(loans()))), gateway);

    let body = body_text(post(&app, "/payments", "").await).await;
    assert!(body.contains(r#"data-phase="error""#));

    let body = body_text(post(&app, "/payments", "").await).await;
    assert!(body.contains(r#"data-phase="error""#));
}

fn submit_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/payments")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_overlapping_submit_is_refused_without_blocking() {
    let gateway = FakePayments::slow(
        Ok(GatewayResponse::new(201, r#"{"id": 10}"#)),
        Duration::from_millis(300),
    );
    let source = FakeLoans::new(Ok(LoansResponse::with_loans(loans())));
    let app = app(source.clone(), gateway.clone());
    get(&app, "/partials/loans").await;
    post(&app, "/payments/loan", "loan_id=1").await;

    let first = tokio::spawn(app.clone().oneshot(submit_request()));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = tokio::time::timeout(Duration::from_secs(3), app.clone().oneshot(submit_request()))
        .await
        .expect("second submit should answer while the first is in flight")
        .unwrap();
    assert!(second.headers().get("HX-Trigger").is_none());
    let body = body_text(second).await;
    assert!(body.contains(r#"data-phase="submitting""#));
    assert!(body.contains(" disabled>"));

    let first = tokio::time::timeout(Duration::from_secs(3), first)
        .await
        .expect("first submit should complete")
        .unwrap()
        .unwrap();
    assert_eq!(first.headers().get("HX-Trigger").unwrap(), "loans-changed");
    assert!(body_text(first).await.contains("Payment added successfully!"));

    // Only the first submission reached the backend.
    assert_eq!(gateway.requests().len(), 1);

    let (status, body) = tokio::time::timeout(
        Duration::from_secs(2),
        get(&app, "/partials/payment-form"),
    )
    .await
    .expect("form should stay responsive");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"data-phase="success""#));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_selection_is_ignored_while_submitting() {
    let gateway = FakePayments::slow(
        Ok(GatewayResponse::new(400, r#"{"error": {"payment_date": ["Required"]}}"#)),
        Duration::from_millis(300),
    );
    let app = app(FakeLoans::new(Ok(LoansResponse::with_loans(loans()))), gateway.clone());
    get(&app, "/partials/loans").await;
    post(&app, "/payments/loan", "loan_id=1").await;

    let submit = tokio::spawn(app.clone().oneshot(submit_request()));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let during = tokio::time::timeout(Duration::from_secs(3), post(&app, "/payments/loan", "loan_id=2"))
        .await
        .expect("selection should answer while a submit is in flight");
    let body = body_text(during).await;
    assert!(body.contains(r#"data-phase="submitting""#));
    assert!(body.contains(r#"<option value="1" selected>"#));
    assert!(body.contains(r#"value="875.00""#));

    let done = tokio::time::timeout(Duration::from_secs(3), submit)
        .await
        .expect("submit should complete")
        .unwrap()
        .unwrap();
    let body = body_text(done).await;
    assert!(body.contains("Required"));
    // The field values the request was built from are still there.
    assert!(body.contains(r#"<option value="1" selected>"#));
    assert!(gateway.requests()[0].contains(r#""loan_id":1"#));
}
