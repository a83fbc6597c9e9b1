// File: crates/klinik_booking/src/doc.rs

#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::booking::{BookingConfirmation, CancellationResult};
use crate::calendar::{
    AvailableDate, AvailableDatesResponse, CheckAvailabilityResponse, DayAvailabilityResponse,
    DaySlot, DaySummary, MonthAvailabilityResponse,
};
use crate::forms::{ContactReceipt, InitializeReport, IntakeReceipt, TableStatus};
use crate::generator::{GeneratedRange, GenerationReport};
use crate::handlers::{EnvironmentCheck, HealthResponse};
use crate::models::{
    ActionRequest, BookingRequest, CancelRequest, ContactRequest, DateQuery, GenerateRequest,
    IntakeRequest, MonthQuery, RangeQuery,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::action_handler,
        crate::handlers::health_handler
    ),
    components(
        schemas(
            ActionRequest,
            DateQuery,
            MonthQuery,
            RangeQuery,
            BookingRequest,
            CancelRequest,
            IntakeRequest,
            ContactRequest,
            GenerateRequest,
            CheckAvailabilityResponse,
            MonthAvailabilityResponse,
            DaySummary,
            DayAvailabilityResponse,
            DaySlot,
            AvailableDatesResponse,
            AvailableDate,
            BookingConfirmation,
            CancellationResult,
            IntakeReceipt,
            ContactReceipt,
            GenerationReport,
            GeneratedRange,
            InitializeReport,
            TableStatus,
            HealthResponse,
            EnvironmentCheck
        )
    ),
    tags(
        (name = "Klinik", description = "Appointment availability and booking actions")
    ),
    servers(
        (url = "/api", description = "Klinik API server")
    )
)]
pub struct KlinikApiDoc;
