// File: crates/klinik_booking/src/handlers.rs
use crate::availability::AvailabilityRules;
use crate::booking::BookingCoordinator;
use crate::calendar::{self, DateRange, MAX_WEEKS, MAX_YEAR_SPAN};
use crate::error::BookingError;
use crate::events::EventPublisher;
use crate::forms;
use crate::generator::{generate_time_slots, ShiftTemplate};
use crate::models::{supported_actions, ActionRequest, GenerateRequest, SUPPORTED_ACTIONS};
use crate::validation::required;
use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use klinik_common::services::SheetStore;
use klinik_common::KlinikError;
use klinik_config::AppConfig;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

const DEFAULT_WEEKS: u32 = 4;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

// Shared state of the /klinik routes
#[derive(Clone)]
pub struct KlinikState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SheetStore>,
    pub coordinator: Arc<BookingCoordinator>,
    pub events: EventPublisher,
    pub clock: Clock,
}

impl KlinikState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn SheetStore>, events: EventPublisher) -> Self {
        let coordinator =
            BookingCoordinator::from_config(store.clone(), config.booking.as_ref(), events.clone());
        Self {
            config,
            store,
            coordinator: Arc::new(coordinator),
            events,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock, e.g. to pin "now" in tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn rules(&self) -> &AvailabilityRules {
        self.coordinator.rules()
    }

    fn default_weeks(&self) -> u32 {
        self.config
            .booking
            .as_ref()
            .and_then(|b| b.default_weeks)
            .unwrap_or(DEFAULT_WEEKS)
    }

    /// `years` wins over `weeks`; both absent means the configured number of weeks.
    fn resolve_range(
        &self,
        weeks: Option<i64>,
        years: Option<&[i32]>,
    ) -> Result<DateRange, BookingError> {
        let today = self.rules().today(self.now());
        if let Some(years) = years.filter(|y| !y.is_empty()) {
            return DateRange::for_years(today, years).ok_or_else(|| {
                BookingError::invalid(format!(
                    "years must be valid calendar years spanning at most {}",
                    MAX_YEAR_SPAN
                ))
            });
        }
        let weeks = match weeks {
            None => self.default_weeks(),
            Some(w) => u32::try_from(w)
                .ok()
                .filter(|w| *w > 0)
                .ok_or_else(|| BookingError::invalid("weeks must be a positive number"))?,
        };
        DateRange::next_weeks(today, weeks).ok_or_else(|| {
            BookingError::invalid(format!("weeks must be at most {}", MAX_WEEKS))
        })
    }
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    payload: T,
}

fn ok<T: Serialize>(payload: T) -> Response {
    Json(Envelope {
        success: true,
        payload,
    })
    .into_response()
}

/// Rejection body: `{success: false, error, code}` plus any `extra` fields.
pub fn failure(err: &BookingError, extra: Value) -> Response {
    let mut body = Map::new();
    body.insert("success".to_string(), json!(false));
    body.insert("error".to_string(), json!(err.to_string()));
    body.insert("code".to_string(), json!(err.code()));
    if let Value::Object(fields) = extra {
        body.extend(fields);
    }
    Json(Value::Object(body)).into_response()
}

fn template(request: &GenerateRequest) -> Result<ShiftTemplate, BookingError> {
    let defaults = ShiftTemplate::default();
    let default_start = defaults.start.format("%H:%M").to_string();
    let default_end = defaults.end.format("%H:%M").to_string();
    ShiftTemplate::parse(
        request.start_time.as_deref().unwrap_or(&default_start),
        request.end_time.as_deref().unwrap_or(&default_end),
        request
            .interval_minutes
            .unwrap_or(i64::from(defaults.interval_minutes)),
        request
            .max_capacity
            .unwrap_or(i64::from(defaults.max_capacity)),
    )
}

/// Runs one decoded action against the store.
pub async fn dispatch(state: &KlinikState, request: ActionRequest) -> Result<Response, BookingError> {
    let now = state.now();
    let store = state.store.as_ref();
    let rules = state.rules();

    match request {
        ActionRequest::CheckAvailability(query) => {
            let date = required(query.date.as_deref(), "date")?;
            Ok(ok(calendar::check_availability(store, date).await?))
        }
        ActionRequest::MonthAvailability(query) => {
            let (current_year, current_month) = calendar::current_month(now, rules);
            let year = match query.year {
                Some(y) => i32::try_from(y)
                    .map_err(|_| BookingError::invalid(format!("Invalid year: {}", y)))?,
                None => current_year,
            };
            let month = match query.month {
                Some(m) => u32::try_from(m)
                    .map_err(|_| BookingError::invalid(format!("Invalid month: {}", m)))?,
                None => current_month,
            };
            Ok(ok(calendar::month_availability(store, year, month, now, rules).await?))
        }
        ActionRequest::DayAvailability(query) => {
            let date = required(query.date.as_deref(), "date")?;
            match calendar::day_availability(store, date, now, rules).await {
                Ok(day) => Ok(ok(day)),
                Err(err @ BookingError::DayTooSoon) => Ok(failure(
                    &err,
                    json!({ "slots": [], "available_slots": [] }),
                )),
                Err(err) => Err(err),
            }
        }
        ActionRequest::GetAvailableDates(query) => {
            let range = state.resolve_range(query.weeks, query.years.as_deref())?;
            Ok(ok(calendar::get_available_dates(store, range, now, rules).await?))
        }
        ActionRequest::BookAppointment(request) => {
            Ok(ok(state.coordinator.book(&request, now).await?))
        }
        ActionRequest::BookIntake(request) => Ok(ok(
            forms::submit_intake(store, &state.events, &request, now).await?,
        )),
        ActionRequest::CancelAppointment(request) => Ok(ok(state
            .coordinator
            .cancel(request.appointment_id.as_deref(), now)
            .await?)),
        ActionRequest::SubmitContact(request) => {
            Ok(ok(forms::submit_contact(store, &request, now).await?))
        }
        ActionRequest::GenerateTimeSlots(request) => {
            let template = template(&request)?;
            let range = state.resolve_range(request.weeks, request.years.as_deref())?;
            Ok(ok(
                generate_time_slots(store, range, &template, request.overwrite).await?,
            ))
        }
        // The report carries its own `success`
        ActionRequest::InitializeTables {} => {
            Ok(Json(forms::initialize_tables(store).await).into_response())
        }
    }
}

/// Handler for every `POST /klinik` action.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/klinik",
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Action result; `success` tells whether it was carried out"),
        (status = 400, description = "Body is not JSON"),
    ),
    tag = "Klinik"
))]
pub async fn action_handler(State(state): State<Arc<KlinikState>>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            info!("Rejecting request with a non-JSON body: {}", err);
            return KlinikError::from(err).into_response();
        }
    };

    let action = value
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if !SUPPORTED_ACTIONS.contains(&action.as_str()) {
        info!("Unknown action '{}'", action);
        return failure(&BookingError::UnknownAction(supported_actions()), Value::Null);
    }

    let request: ActionRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(err) => {
            debug!("Parameters of '{}' rejected: {}", action, err);
            return failure(&BookingError::invalid(err.to_string()), Value::Null);
        }
    };

    let action = request.name();
    info!("Handling action '{}'", action);
    match dispatch(&state, request).await {
        Ok(response) => response,
        Err(err) => {
            match &err {
                BookingError::Store(store_err) => {
                    error!("Action '{}' failed on the store: {}", action, store_err)
                }
                other => info!("Action '{}' rejected: {}", action, other),
            }
            failure(&err, Value::Null)
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct EnvironmentCheck {
    pub spreadsheet_id: bool,
    pub sheets_credentials: bool,
    pub gmail_credentials: bool,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub version: String,
    pub environment_check: EnvironmentCheck,
}

/// Liveness probe. Reports which settings are present, never their values.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/klinik",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    ),
    tag = "Klinik"
))]
pub async fn health_handler(State(state): State<Arc<KlinikState>>) -> Json<HealthResponse> {
    let sheets = state.config.sheets.as_ref();
    let gmail = state.config.gmail.as_ref();
    Json(HealthResponse {
        success: true,
        message: "Klinik Appointment System API is running".to_string(),
        timestamp: state.now().to_rfc3339_opts(SecondsFormat::Millis, true),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment_check: EnvironmentCheck {
            spreadsheet_id: sheets.is_some_and(|s| !s.spreadsheet_id.is_empty()),
            sheets_credentials: sheets.is_some_and(|s| s.has_credentials()),
            gmail_credentials: gmail.is_some_and(|g| {
                !g.client_id.is_empty() && !g.client_secret.is_empty() && !g.refresh_token.is_empty()
            }),
        },
    })
}
