// --- File: crates/klinik_booking/src/models.rs ---
//! Request bodies of the action endpoint.
//!
//! The website posts loosely typed JSON: numbers arrive as strings, `years` as a
//! single value or a list. The deserializers below accept those shapes and
//! reject anything that cannot be read as the intended type.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

pub const SUPPORTED_ACTIONS: [&str; 10] = [
    "check_availability",
    "month_availability",
    "day_availability",
    "get_available_dates",
    "book_appointment",
    "book_intake",
    "cancel_appointment",
    "submit_contact",
    "generate_time_slots",
    "initialize_tables",
];

pub fn supported_actions() -> String {
    SUPPORTED_ACTIONS.join(", ")
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(de::Error::custom(format!("expected text, found {}", other))),
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => as_integer(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a whole number, found {}", value))),
    }
}

/// Like `number`, but unreadable input counts as absent.
fn number_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.as_ref().and_then(as_integer))
}

fn years<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<i32>>, D::Error> {
    let to_year = |v: &Value| -> Result<i32, D::Error> {
        as_integer(v)
            .and_then(|y| i32::try_from(y).ok())
            .ok_or_else(|| de::Error::custom(format!("expected a year, found {}", v)))
    };
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items.iter().map(to_year).collect::<Result<Vec<_>, _>>().map(Some),
        Some(single) => Ok(Some(vec![to_year(&single)?])),
    }
}

/// Only a literal `true` enables a destructive flag.
fn literal_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Option::<Value>::deserialize(deserializer)?, Some(Value::Bool(true))))
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    })
}

#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct DateQuery {
    #[serde(deserialize_with = "text")]
    #[cfg_attr(feature = "openapi", schema(example = "2025-11-10"))]
    pub date: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct MonthQuery {
    #[serde(deserialize_with = "number")]
    #[cfg_attr(feature = "openapi", schema(example = 2025))]
    pub year: Option<i64>,
    #[serde(deserialize_with = "number")]
    #[cfg_attr(feature = "openapi", schema(example = 11))]
    pub month: Option<i64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct RangeQuery {
    #[serde(deserialize_with = "number")]
    #[cfg_attr(feature = "openapi", schema(example = 4))]
    pub weeks: Option<i64>,
    #[serde(deserialize_with = "years")]
    pub years: Option<Vec<i32>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct BookingRequest {
    #[serde(deserialize_with = "text")]
    pub customer_name: Option<String>,
    #[serde(deserialize_with = "text")]
    pub customer_email: Option<String>,
    #[serde(deserialize_with = "text")]
    pub customer_phone: Option<String>,
    #[serde(deserialize_with = "text")]
    #[cfg_attr(feature = "openapi", schema(example = "2025-11-10"))]
    pub appointment_date: Option<String>,
    #[serde(deserialize_with = "text")]
    #[cfg_attr(feature = "openapi", schema(example = "10:00-10:30"))]
    pub appointment_time: Option<String>,
    #[serde(deserialize_with = "text")]
    pub concern: Option<String>,
    #[serde(deserialize_with = "text")]
    pub message: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct CancelRequest {
    #[serde(deserialize_with = "text")]
    pub appointment_id: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct IntakeRequest {
    #[serde(deserialize_with = "text")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "text")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "text")]
    pub date_of_birth: Option<String>,
    #[serde(deserialize_with = "text")]
    pub customer_email: Option<String>,
    #[serde(deserialize_with = "text")]
    pub customer_phone: Option<String>,
    /// Must be a non-empty list.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Vec<String>>))]
    pub concerns: Option<Value>,
    #[serde(deserialize_with = "text")]
    pub enquiries: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub is_first_time: bool,
    #[serde(deserialize_with = "number_or_none")]
    pub duration_minutes: Option<i64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct ContactRequest {
    #[serde(deserialize_with = "text")]
    pub full_name: Option<String>,
    #[serde(deserialize_with = "text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "text")]
    pub subject: Option<String>,
    #[serde(deserialize_with = "text")]
    pub message: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct GenerateRequest {
    #[serde(deserialize_with = "number")]
    pub weeks: Option<i64>,
    #[serde(deserialize_with = "years")]
    pub years: Option<Vec<i32>>,
    /// Deletes existing slots in the range first. Only a JSON `true` enables it.
    #[serde(deserialize_with = "literal_true")]
    pub overwrite: bool,
    #[serde(rename = "startTime", deserialize_with = "text")]
    #[cfg_attr(feature = "openapi", schema(example = "10:00"))]
    pub start_time: Option<String>,
    #[serde(rename = "endTime", deserialize_with = "text")]
    #[cfg_attr(feature = "openapi", schema(example = "18:00"))]
    pub end_time: Option<String>,
    #[serde(rename = "intervalMinutes", deserialize_with = "number")]
    #[cfg_attr(feature = "openapi", schema(example = 30))]
    pub interval_minutes: Option<i64>,
    #[serde(rename = "maxCapacity", deserialize_with = "number")]
    #[cfg_attr(feature = "openapi", schema(example = 1))]
    pub max_capacity: Option<i64>,
}

/// A decoded `POST /klinik` body.
#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    CheckAvailability(DateQuery),
    MonthAvailability(MonthQuery),
    DayAvailability(DateQuery),
    GetAvailableDates(RangeQuery),
    BookAppointment(BookingRequest),
    BookIntake(IntakeRequest),
    CancelAppointment(CancelRequest),
    SubmitContact(ContactRequest),
    GenerateTimeSlots(GenerateRequest),
    InitializeTables {},
}

impl ActionRequest {
    pub fn name(&self) -> &'static str {
        match self {
            ActionRequest::CheckAvailability(_) => "check_availability",
            ActionRequest::MonthAvailability(_) => "month_availability",
            ActionRequest::DayAvailability(_) => "day_availability",
            ActionRequest::GetAvailableDates(_) => "get_available_dates",
            ActionRequest::BookAppointment(_) => "book_appointment",
            ActionRequest::BookIntake(_) => "book_intake",
            ActionRequest::CancelAppointment(_) => "cancel_appointment",
            ActionRequest::SubmitContact(_) => "submit_contact",
            ActionRequest::GenerateTimeSlots(_) => "generate_time_slots",
            ActionRequest::InitializeTables {} => "initialize_tables",
        }
    }
}
