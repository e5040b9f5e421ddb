use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
    Form,
};
use tera::Context;
use tokio::sync::{Mutex, RwLock};

use loandesk_core::{
    CurrencyFormat, GatewayResponse, LoanListView, LoanSource, LoansResponse, PaymentForm,
    PaymentGateway, QueryState, SubmitOutcome, TransportError, SUCCESS_DISMISS_AFTER,
};

use crate::models::{PaymentDateRequest, PaymentFormView, SelectLoanRequest};

/// Event htmx listens for to reload the loan list and the form's loan options.
pub const LOANS_CHANGED_EVENT: &str = "loans-changed";

/// Shared application state
pub struct AppState {
    /// Loaded page templates
    pub tera: tera::Tera,
    /// Runs the `GetLoans` query
    pub loans: Arc<dyn LoanSource>,
    /// Records new payments
    pub payments: Arc<dyn PaymentGateway>,
    /// How amounts are shown
    pub currency: CurrencyFormat,
    /// Latest loan query state, read by every render
    pub query: RwLock<QueryState>,
    /// The add-payment form
    pub form: Mutex<PaymentForm>,
    /// Delay before a success message is hidden again
    pub dismiss_after: Duration,
}

impl AppState {
    /// Create state with a fresh query and an empty form.
    pub fn new(
        tera: tera::Tera,
        loans: Arc<dyn LoanSource>,
        payments: Arc<dyn PaymentGateway>,
        currency: CurrencyFormat,
    ) -> Self {
        Self {
            tera,
            loans,
            payments,
            currency,
            query: RwLock::new(QueryState::new()),
            form: Mutex::new(PaymentForm::new()),
            dismiss_after: SUCCESS_DISMISS_AFTER,
        }
    }
}

/// Run the loan query once `begin()` has been called on the state.
///
/// Locks are released while the request is in flight.
async fn run_query(state: &Arc<AppState>) {
    let source = Arc::clone(&state.loans);
    let result: Result<LoansResponse, TransportError> =
        tokio::task::spawn_blocking(move || source.fetch_loans())
            .await
            .unwrap_or_else(|e| Err(TransportError::Request(format!("loan query task failed: {e}"))));

    match &result {
        Ok(response) => tracing::info!(
            "loan query returned {} loans, {} errors",
            response.loans().map_or(0, <[_]>::len),
            response.errors.len()
        ),
        Err(e) => tracing::warn!("loan query failed: {}", e),
    }

    let loans = {
        let mut query = state.query.write().await;
        query.finish(result);
        query.loans().to_vec()
    };
    // The form's amount depends on the loans it selects from.
    state.form.lock().await.sync_loans(&loans);
}

/// Re-run the loan query (retry button, and after a payment is added).
pub async fn refresh_loans(state: &Arc<AppState>) {
    state.query.write().await.begin();
    run_query(state).await;
}

/// Run the loan query if it has never been issued.
async fn ensure_loaded(state: &Arc<AppState>) {
    let first = {
        let mut query = state.query.write().await;
        let first = query.needs_initial_fetch();
        if first {
            query.begin();
        }
        first
    };
    if first {
        run_query(state).await;
    }
}

async fn list_context(state: &Arc<AppState>) -> Context {
    let view = {
        let query = state.query.read().await;
        LoanListView::build(&query, &state.currency)
    };
    let mut context = Context::new();
    context.insert("view", &view);
    context
}

async fn form_context(state: &Arc<AppState>) -> Context {
    let loans = state.query.read().await.loans().to_vec();
    let form = PaymentFormView::new(&*state.form.lock().await, &loans);
    let mut context = Context::new();
    context.insert("form", &form);
    context
}

fn render(state: &AppState, template: &str, context: &Context) -> Html<String> {
    match state.tera.render(template, context) {
        Ok(t) => Html(t),
        Err(e) => {
            tracing::error!("failed to render {}: {:?}", template, e);
            Html(format!("<h1>Template Error</h1><p>{}</p>", e))
        }
    }
}

/// Handler for the page.
///
/// A full page load starts a new form, unless a submission is in flight.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    {
        let mut form = state.form.lock().await;
        if !form.is_submitting() {
            form.reset();
        }
    }
    let mut context = list_context(&state).await;
    context.extend(form_context(&state).await);
    render(&state, "index.html", &context)
}

/// Loan list fragment. Issues the query on first use.
pub async fn loans_partial(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ensure_loaded(&state).await;
    render(&state, "partials/loan_list.html", &list_context(&state).await)
}

/// Retry: re-issue the query and return the list fragment.
pub async fn refetch_loans(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    refresh_loans(&state).await;
    render(&state, "partials/loan_list.html", &list_context(&state).await)
}

/// Payment form fragment.
pub async fn payment_form_partial(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    render(&state, "partials/payment_form.html", &form_context(&state).await)
}

/// Handler for the loan selector.
pub async fn select_loan(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<SelectLoanRequest>,
) -> impl IntoResponse {
    {
        let query = state.query.read().await;
        let mut form = state.form.lock().await;
        if !form.is_submitting() {
            form.select_loan(&payload.loan_id, query.loans());
        }
    }
    render(&state, "partials/payment_form.html", &form_context(&state).await)
}

/// Handler for the date input.
pub async fn set_payment_date(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<PaymentDateRequest>,
) -> impl IntoResponse {
    {
        let mut form = state.form.lock().await;
        if !form.is_submitting() {
            form.set_payment_date(&payload.payment_date);
        }
    }
    render(&state, "partials/payment_form.html", &form_context(&state).await)
}

/// Handler to submit the payment form.
pub async fn submit_payment(State(state): State<Arc<AppState>>) -> Response {
    // Bound first so the form lock is released before the refusal renders.
    let begun = state.form.lock().await.begin_submit();
    let request = match begun {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("payment submit refused: {}", e);
            return render(&state, "partials/payment_form.html", &form_context(&state).await)
                .into_response();
        }
    };

    tracing::info!(
        "submitting payment for loan {:?} ({:?} on {:?})",
        request.loan_id,
        request.payment_amount,
        request.payment_date
    );
    let gateway = Arc::clone(&state.payments);
    let result: Result<GatewayResponse, TransportError> =
        tokio::task::spawn_blocking(move || gateway.add_payment(&request))
            .await
            .unwrap_or_else(|e| Err(TransportError::Request(format!("payment task failed: {e}"))));

    let mut refresh = false;
    let outcome = state
        .form
        .lock()
        .await
        .complete_submit(result, || refresh = true);

    match &outcome {
        Ok(SubmitOutcome::Added { dismiss_token }) => {
            tracing::info!("payment added");
            let token = *dismiss_token;
            let delayed = Arc::clone(&state);
            tokio::spawn(async move {
                tokio::time::sleep(delayed.dismiss_after).await;
                delayed.form.lock().await.dismiss_success(token);
            });
        }
        Ok(SubmitOutcome::FieldErrors) => tracing::info!("payment rejected with field errors"),
        Ok(SubmitOutcome::Failed(message)) => tracing::warn!("payment failed: {}", message),
        Err(e) => tracing::error!("payment submit out of sequence: {}", e),
    }

    if refresh {
        refresh_loans(&state).await;
        return (
            [("HX-Trigger", LOANS_CHANGED_EVENT)],
            render(&state, "partials/payment_form.html", &form_context(&state).await),
        )
            .into_response();
    }

    render(&state, "partials/payment_form.html", &form_context(&state).await).into_response()
}
