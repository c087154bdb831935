//! HTTP surface for the pricing engine.
//!
//! Every pricing call touches blocking collaborators, so handlers hand the
//! work to tokio's blocking pool.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use crate::composer::{PriceBreakdown, PriceComposer};
use crate::error::PricingError;
use crate::location::{LocationResult, LocationType};
use crate::package::Package;
use crate::request::{QuoteRequest, VatRate, parse_date, parse_flag, parse_time, required};
use crate::slot::{SlotQuery, SlotResult};
use crate::traits::{BasePriceProvider, CalendarLoadProvider, DistanceProvider, LocalAddressSource};
use crate::urgency::{UrgencyResult, UrgencyTier};

/// What the routes need from the pricing engine.
pub trait QuoteEngine: Send + Sync + 'static {
    fn classify_location(&self, address: &str) -> Result<LocationResult, PricingError>;
    fn classify_urgency(&self, date: NaiveDate, today: NaiveDate) -> Result<UrgencyResult, PricingError>;
    fn resolve_slot(&self, query: &SlotQuery) -> Result<SlotResult, PricingError>;
    fn compose(&self, request: &QuoteRequest, today: NaiveDate) -> Result<PriceBreakdown, PricingError>;
    fn service_names(&self) -> Result<Vec<String>, PricingError>;
    fn street_names(&self) -> Result<Vec<String>, PricingError>;
}

impl<P, A, D, C> QuoteEngine for PriceComposer<P, A, D, C>
where
    P: BasePriceProvider + Send + Sync + 'static,
    A: LocalAddressSource + Send + Sync + 'static,
    D: DistanceProvider + Send + Sync + 'static,
    C: CalendarLoadProvider + Send + Sync + 'static,
{
    fn classify_location(&self, address: &str) -> Result<LocationResult, PricingError> {
        PriceComposer::classify_location(self, address)
    }

    fn classify_urgency(&self, date: NaiveDate, today: NaiveDate) -> Result<UrgencyResult, PricingError> {
        PriceComposer::classify_urgency(self, date, today)
    }

    fn resolve_slot(&self, query: &SlotQuery) -> Result<SlotResult, PricingError> {
        PriceComposer::resolve_slot(self, query)
    }

    fn compose(&self, request: &QuoteRequest, today: NaiveDate) -> Result<PriceBreakdown, PricingError> {
        PriceComposer::compose(self, request, today)
    }

    fn service_names(&self) -> Result<Vec<String>, PricingError> {
        self.prices().service_names()
    }

    fn street_names(&self) -> Result<Vec<String>, PricingError> {
        self.addresses().street_names()
    }
}

/// `{"error": message}` with a status derived from the root cause.
#[derive(Debug)]
pub struct ApiError(pub PricingError);

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.root_cause() {
            PricingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PricingError::NotFound(_) => StatusCode::NOT_FOUND,
            PricingError::LookupUnavailable(_) => StatusCode::BAD_GATEWAY,
            PricingError::DependencyFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        if status.is_server_error() {
            error!(%status, error = %message, "request failed");
        } else {
            warn!(%status, error = %message, "request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PricingError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| PricingError::unavailable(format!("pricing worker failed: {err}")))?
        .map(Json)
        .map_err(ApiError)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn router<E: QuoteEngine>(engine: Arc<E>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/pricing/location-modifier", get(location_modifier::<E>))
        .route("/pricing/when-modifier", get(when_modifier::<E>))
        .route("/pricing/slot-modifier", get(slot_modifier::<E>))
        .route("/pricing/full", get(full_price::<E>))
        .route("/pricing/services", get(services::<E>))
        .route("/pricing/local-streets", get(local_streets::<E>))
        .with_state(engine)
}

async fn index() -> &'static str {
    "Pricing service is running"
}

#[derive(Debug, Deserialize)]
pub struct LocationParams {
    address: Option<String>,
}

async fn location_modifier<E: QuoteEngine>(
    State(engine): State<Arc<E>>,
    Query(params): Query<LocationParams>,
) -> ApiResult<LocationResult> {
    let address = required(params.address.as_deref(), "address")?.to_string();
    blocking(move || engine.classify_location(&address)).await
}

#[derive(Debug, Deserialize)]
pub struct WhenParams {
    date: Option<String>,
}

async fn when_modifier<E: QuoteEngine>(
    State(engine): State<Arc<E>>,
    Query(params): Query<WhenParams>,
) -> ApiResult<UrgencyResult> {
    let date = parse_date(required(params.date.as_deref(), "date")?)?;
    Ok(Json(engine.classify_urgency(date, today())?))
}

#[derive(Debug, Deserialize)]
pub struct SlotParams {
    date: Option<String>,
    time: Option<String>,
    urgency: Option<String>,
    location: Option<String>,
    #[serde(rename = "override")]
    override_now: Option<String>,
}

async fn slot_modifier<E: QuoteEngine>(
    State(engine): State<Arc<E>>,
    Query(params): Query<SlotParams>,
) -> ApiResult<SlotResult> {
    let query = SlotQuery {
        date: parse_date(required(params.date.as_deref(), "date")?)?,
        time: parse_time(required(params.time.as_deref(), "time")?)?,
        urgency: required(params.urgency.as_deref(), "urgency")?.parse::<UrgencyTier>()?,
        location: required(params.location.as_deref(), "location")?.parse::<LocationType>()?,
        override_now: parse_flag(params.override_now.as_deref()),
    };
    blocking(move || engine.resolve_slot(&query)).await
}

#[derive(Debug, Deserialize)]
pub struct FullParams {
    service: Option<String>,
    address: Option<String>,
    date: Option<String>,
    time: Option<String>,
    package: Option<String>,
    vat: Option<String>,
    #[serde(rename = "override")]
    override_now: Option<String>,
}

fn quote_request(params: &FullParams) -> Result<QuoteRequest, PricingError> {
    let service = required(params.service.as_deref(), "service")?;
    let address = required(params.address.as_deref(), "address")?;
    let date = parse_date(required(params.date.as_deref(), "date")?)?;
    let time = parse_time(required(params.time.as_deref(), "time")?)?;
    let vat = match params.vat.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw.parse::<VatRate>()?,
        _ => VatRate::Reduced,
    };
    let package = Package::from_code(params.package.as_deref().unwrap_or("safe"));

    Ok(QuoteRequest::new(service, address, date, time)
        .vat(vat)
        .package(package)
        .override_now(parse_flag(params.override_now.as_deref())))
}

async fn full_price<E: QuoteEngine>(
    State(engine): State<Arc<E>>,
    Query(params): Query<FullParams>,
) -> ApiResult<PriceBreakdown> {
    let request = quote_request(&params)?;
    let today = today();
    blocking(move || engine.compose(&request, today)).await
}

#[derive(Debug, Serialize)]
pub struct ServiceList {
    services: Vec<String>,
}

async fn services<E: QuoteEngine>(State(engine): State<Arc<E>>) -> ApiResult<ServiceList> {
    blocking(move || Ok(ServiceList { services: engine.service_names()? })).await
}

#[derive(Debug, Serialize)]
pub struct StreetList {
    streets: Vec<String>,
}

async fn local_streets<E: QuoteEngine>(State(engine): State<Arc<E>>) -> ApiResult<StreetList> {
    blocking(move || Ok(StreetList { streets: engine.street_names()? })).await
}
