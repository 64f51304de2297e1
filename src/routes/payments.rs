use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::request::Parts,
    response::{IntoResponse, Response},
    routing::post,
};

use crate::{
    dto::payments::{
        CreateIntentRequest, CreateIntentResponse, PaymentErrorBody, VerifyPaymentRequest,
        VerifyPaymentResponse,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::payment_service,
    state::AppState,
};

/// The two payment endpoints keep their original flat bodies: `{success,
/// order}` on 200 and `{error}` otherwise. Everything else in the API uses
/// the standard envelope.
pub struct PaymentError(AppError);

impl From<AppError> for PaymentError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let body = Json(PaymentErrorBody {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

/// AuthUser with the flat error body on rejection.
pub struct PaymentAuth(pub AuthUser);

impl<S> FromRequestParts<S> for PaymentAuth
where
    S: Send + Sync,
{
    type Rejection = PaymentError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(Self(user))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/intent", post(create_intent))
        .route("/verify", post(verify_payment))
}

#[utoipa::path(
    post,
    path = "/api/payments/intent",
    request_body = CreateIntentRequest,
    responses(
        (status = 200, description = "Gateway intent created", body = CreateIntentResponse),
        (status = 400, description = "Invalid amount", body = PaymentErrorBody),
        (status = 401, description = "Unauthenticated", body = PaymentErrorBody),
        (status = 500, description = "Gateway failure", body = PaymentErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_intent(
    State(state): State<AppState>,
    PaymentAuth(user): PaymentAuth,
    Json(payload): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, PaymentError> {
    let resp = payment_service::create_intent(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified and order committed", body = VerifyPaymentResponse),
        (status = 400, description = "Invalid payment signature", body = PaymentErrorBody),
        (status = 401, description = "Unauthenticated", body = PaymentErrorBody),
        (status = 500, description = "Commit failure", body = PaymentErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    PaymentAuth(user): PaymentAuth,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, PaymentError> {
    let resp = payment_service::verify_and_commit(&state, &user, payload).await?;
    Ok(Json(resp))
}
