// Cafe POS - HTTP API
// The three views (New Order, Log Expense, Dashboard) as JSON endpoints.
// Every request locks the single PointOfSale, so operations never overlap.

use crate::config::PosConfig;
use crate::error::StoreError;
use crate::menu::Menu;
use crate::pos::PointOfSale;
use crate::records::{Expense, ExpenseCategory, Sale};
use crate::report::{parse_month, MonthlyReport};
use crate::store::RecordStore;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, warn};

pub type SharedPos = Arc<Mutex<PointOfSale<Box<dyn RecordStore + Send>>>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pos: SharedPos,
    menu: Arc<Menu>,
}

impl AppState {
    pub fn new(pos: PointOfSale<Box<dyn RecordStore + Send>>, config: &PosConfig) -> Self {
        Self {
            pos: Arc::new(Mutex::new(pos)),
            menu: Arc::new(config.menu.clone()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, PointOfSale<Box<dyn RecordStore + Send>>>, ApiError> {
        self.pos
            .lock()
            .map_err(|_| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "store lock poisoned"))
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let status = match &e {
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::SchemaMismatch { .. }
            | StoreError::InvalidRow { .. }
            | StoreError::UnknownStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::BAD_REQUEST {
            warn!(error = %e, "request rejected");
        } else {
            error!(error = %e, "store operation failed");
        }

        ApiError::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaleRequest {
    pub item: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Defaults to the menu price
    pub unit_price: Option<f64>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    pub category: String,
    pub item: String,
    pub cost: f64,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/menu - Items and default prices
async fn get_menu(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.menu.items().to_vec()))
}

/// GET /api/report?month=YYYY-MM - Monthly report (current month by default)
async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ApiResponse<MonthlyReport>>, ApiError> {
    let mut pos = state.lock()?;

    let report = match query.month.as_deref() {
        Some(month) => pos.report_for(&parse_month(month)?)?,
        None => pos.dashboard()?,
    };

    Ok(Json(ApiResponse::ok(report)))
}

/// POST /api/refresh - Drop the cached read
async fn refresh(State(state): State<AppState>) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    state.lock()?.refresh();
    Ok(Json(ApiResponse::ok("refreshed")))
}

/// POST /api/sales - Record a sale
async fn create_sale(
    State(state): State<AppState>,
    Json(request): Json<SaleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Sale>>), ApiError> {
    let menu_item = state.menu.find(&request.item);

    let unit_price = match (request.unit_price, menu_item) {
        (Some(price), _) => price,
        (None, Some(item)) => item.price,
        (None, None) => {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                format!("'{}' is not on the menu; send unit_price", request.item),
            ))
        }
    };
    let name = menu_item.map(|m| m.name.as_str()).unwrap_or(&request.item);

    let sale = state.lock()?.submit_sale(name, request.quantity, unit_price)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(sale))))
}

/// POST /api/expenses - Log an expense
async fn create_expense(
    State(state): State<AppState>,
    Json(request): Json<ExpenseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Expense>>), ApiError> {
    let category: ExpenseCategory = request.category.parse()?;
    let expense = state.lock()?.submit_expense(category, &request.item, request.cost)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(expense))))
}

/// Build the `/api` router
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/menu", get(get_menu))
        .route("/report", get(get_report))
        .route("/refresh", post(refresh))
        .route("/sales", post(create_sale))
        .route("/expenses", post(create_expense))
        .with_state(state);

    Router::new().nest("/api", api_routes)
}
