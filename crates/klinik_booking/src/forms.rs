// --- File: crates/klinik_booking/src/forms.rs ---
//! Intake and contact forms, and worksheet initialisation.
//!
//! None of these touch `time_slots`.

use crate::booking::{new_reference, timestamp};
use crate::error::BookingError;
use crate::events::{DomainEvent, EventPublisher, IntakeNotice};
use crate::models::{ContactRequest, IntakeRequest};
use crate::normalize::cell_text;
use crate::table::Table;
use crate::validation::{check_email, is_valid_au_phone, required};
use chrono::{DateTime, Utc};
use klinik_common::services::{ensure_sheet, SheetStore};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Sessions longer than this require a deposit.
pub const DEPOSIT_THRESHOLD_MINUTES: i64 = 45;

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "YES"
    } else {
        "NO"
    }
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct IntakeReceipt {
    pub message: String,
    pub deposit_required: bool,
}

pub async fn submit_intake(
    store: &dyn SheetStore,
    events: &EventPublisher,
    request: &IntakeRequest,
    now: DateTime<Utc>,
) -> Result<IntakeReceipt, BookingError> {
    let first_name = required(request.first_name.as_deref(), "first_name")?;
    let last_name = required(request.last_name.as_deref(), "last_name")?;
    let date_of_birth = required(request.date_of_birth.as_deref(), "date_of_birth")?;
    let email = required(request.customer_email.as_deref(), "customer_email")?;
    let phone = required(request.customer_phone.as_deref(), "customer_phone")?;
    let concerns: Vec<String> = match &request.concerns {
        Some(Value::Array(items)) if !items.is_empty() => items.iter().map(cell_text).collect(),
        _ => return Err(BookingError::MissingField("concerns")),
    };

    check_email(email)?;
    if !is_valid_au_phone(phone) {
        return Err(BookingError::InvalidPhone);
    }

    ensure_sheet(store, Table::Appointments.name(), Table::Appointments.headers()).await?;

    let duration = request.duration_minutes.and_then(|d| u32::try_from(d).ok());
    let deposit_required = request
        .duration_minutes
        .is_some_and(|d| d > DEPOSIT_THRESHOLD_MINUTES);
    let enquiries = request.enquiries.as_deref().unwrap_or("");
    let created_at = timestamp(now);

    let row = vec![
        json!(created_at),
        json!(first_name),
        json!(last_name),
        json!(date_of_birth),
        json!(email),
        json!(phone),
        json!(concerns.join("; ")),
        json!(enquiries),
        json!(yes_no(request.is_first_time)),
        json!(request.duration_minutes.map(|d| d.to_string()).unwrap_or_default()),
        json!(yes_no(deposit_required)),
    ];
    store
        .append_rows(&Table::Appointments.full_range(), vec![row])
        .await?;

    let reference = new_reference("APT_");
    info!("Intake {} stored (deposit required: {})", reference, deposit_required);
    events.publish(DomainEvent::IntakeSubmitted(IntakeNotice {
        reference,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        date_of_birth: date_of_birth.to_string(),
        customer_email: email.to_string(),
        customer_phone: phone.to_string(),
        concerns,
        enquiries: enquiries.to_string(),
        is_first_time: request.is_first_time,
        duration_minutes: duration,
        deposit_required,
        created_at,
    }));

    Ok(IntakeReceipt {
        message: "Intake submitted successfully".to_string(),
        deposit_required,
    })
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ContactReceipt {
    #[cfg_attr(feature = "openapi", schema(example = "MSG_7K2P9QXA"))]
    pub message_id: String,
}

pub async fn submit_contact(
    store: &dyn SheetStore,
    request: &ContactRequest,
    now: DateTime<Utc>,
) -> Result<ContactReceipt, BookingError> {
    let full_name = required(request.full_name.as_deref(), "full_name")?;
    let email = required(request.email.as_deref(), "email")?;
    let subject = required(request.subject.as_deref(), "subject")?;
    let message = required(request.message.as_deref(), "message")?;
    check_email(email)?;

    ensure_sheet(store, Table::Contact.name(), Table::Contact.headers()).await?;

    let message_id = new_reference("MSG_");
    let row = vec![
        json!(message_id),
        json!(full_name),
        json!(email),
        json!(request.phone.as_deref().unwrap_or("")),
        json!(subject),
        json!(message),
        json!(timestamp(now)),
    ];
    store
        .append_rows(&Table::Contact.full_range(), vec![row])
        .await?;

    info!("Contact message {} stored", message_id);
    Ok(ContactReceipt { message_id })
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TableStatus {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct InitializeReport {
    pub success: bool,
    pub message: String,
    pub results: BTreeMap<String, TableStatus>,
}

/// Creates any missing worksheet. One failing table does not stop the others.
pub async fn initialize_tables(store: &dyn SheetStore) -> InitializeReport {
    let mut results = BTreeMap::new();
    for table in Table::ALL {
        let name = table.name();
        let status = match ensure_sheet(store, name, table.headers()).await {
            Ok(_) => TableStatus {
                success: true,
                message: format!("{} table initialized successfully", name),
            },
            Err(err) => {
                warn!("Failed to initialize {}: {}", name, err);
                TableStatus {
                    success: false,
                    message: format!("Failed to initialize {}: {}", name, err),
                }
            }
        };
        results.insert(name.to_string(), status);
    }

    let success = results.values().all(|s| s.success);
    InitializeReport {
        success,
        message: if success {
            "All tables initialized successfully".to_string()
        } else {
            "Some tables failed to initialize. Check details.".to_string()
        },
        results,
    }
}
