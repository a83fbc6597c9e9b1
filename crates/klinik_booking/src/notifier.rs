// --- File: crates/klinik_booking/src/notifier.rs ---
//! Operator e-mails for bookings and intake forms.
//!
//! Delivery runs on its own task fed by [`EventPublisher`](crate::events::EventPublisher),
//! so a slow or failing mail transport never holds up a request.

use crate::events::{BookingNotice, DomainEvent, IntakeNotice};
use klinik_common::services::{
    BoxFuture, DynNotifier, InlineImage, NotificationResult, NotificationService, OutgoingEmail,
};
use klinik_config::GmailConfig;
use std::convert::Infallible;
use std::path::Path;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const LOGO_CONTENT_ID: &str = "logo@klinikka";
const DEFAULT_MAIL_TO: &str = "info@winda.com.au";
const DEFAULT_MAIL_FROM: &str = "no-reply@klinikka.local";

const BRAND_BG: &str = "#fff7e6";
const CARD_BG: &str = "#fffdf5";
const TEXT: &str = "#111111";
const MUTED: &str = "#444444";
const GOLD: &str = "#c9a227";
const BORDER: &str = "#e5decf";

/// Addresses and branding used when rendering.
#[derive(Debug, Clone, Default)]
pub struct MailSettings {
    pub to: String,
    pub from: String,
    pub logo: Option<Vec<u8>>,
}

impl MailSettings {
    pub fn from_config(config: Option<&GmailConfig>) -> Self {
        let to = config
            .and_then(|c| c.mail_to.clone())
            .unwrap_or_else(|| DEFAULT_MAIL_TO.to_string());
        let from = config
            .and_then(|c| c.mail_from.clone())
            .or_else(|| config.map(|c| c.user.clone()).filter(|u| !u.is_empty()))
            .unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string());
        let logo = config
            .and_then(|c| c.logo_path.as_deref())
            .and_then(|path| load_logo(Path::new(path)));
        Self { to, from, logo }
    }
}

/// Reads the inline logo. A missing file only costs the logo.
pub fn load_logo(path: &Path) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) if !bytes.is_empty() => {
            info!("Loaded e-mail logo from {} ({} bytes)", path.display(), bytes.len());
            Some(bytes)
        }
        Ok(_) => {
            warn!("E-mail logo {} is empty, sending without logo", path.display());
            None
        }
        Err(err) => {
            warn!("Could not load e-mail logo {}: {}. Sending without logo", path.display(), err);
            None
        }
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn html_document(heading: &str, fields: &[(&str, String)], with_logo: bool) -> String {
    let logo = if with_logo {
        format!(
            r#"<img src="cid:{}" alt="Klinikka" width="140" style="display:block; margin:0 auto 8px;" />"#,
            LOGO_CONTENT_ID
        )
    } else {
        String::new()
    };
    let rows: String = fields
        .iter()
        .map(|(label, value)| {
            format!(
                r#"<tr><td style="padding:12px; color:{muted}; border-bottom:1px solid {border}; width:40%; vertical-align:top;">{label}</td><td style="padding:12px; color:{text}; border-bottom:1px solid {border}; font-weight:600; white-space:pre-wrap;">{value}</td></tr>"#,
                muted = MUTED,
                border = BORDER,
                text = TEXT,
                label = escape_html(label),
                value = escape_html(value),
            )
        })
        .collect();

    format!(
        r#"<div style="margin:0; padding:0; background:{bg};"><table role="presentation" width="100%" cellspacing="0" cellpadding="0"><tr><td align="center" style="padding:24px;"><table role="presentation" width="600" cellspacing="0" cellpadding="0" style="max-width:600px; background:{card}; border:1px solid {border}; border-radius:14px;"><tr><td align="center" style="padding:24px 24px 8px 24px;">{logo}<div style="color:{gold}; letter-spacing:2px; font-size:12px; text-transform:uppercase;">{heading}</div></td></tr><tr><td style="padding:0 24px 24px 24px;"><table role="presentation" width="100%" cellspacing="0" cellpadding="0">{rows}</table></td></tr></table></td></tr></table></div>"#,
        bg = BRAND_BG,
        card = CARD_BG,
        border = BORDER,
        gold = GOLD,
        logo = logo,
        heading = escape_html(heading),
        rows = rows,
    )
}

fn text_document(heading: &str, fields: &[(&str, String)]) -> String {
    let mut lines = vec![heading.to_string()];
    lines.extend(fields.iter().map(|(label, value)| format!("{}: {}", label, value)));
    lines.join("\n")
}

fn booking_fields(n: &BookingNotice) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("Appointment ID", n.appointment_id.clone()),
        ("Customer Name", n.customer_name.clone()),
        ("Email", n.customer_email.clone()),
        ("Phone", n.customer_phone.clone()),
        ("Appointment Date", n.appointment_date.clone()),
        ("Appointment Time", n.appointment_time.clone()),
        ("Concern", n.concern.clone()),
    ];
    if !n.message.is_empty() {
        fields.push(("Message", n.message.clone()));
    }
    fields
}

fn yes_no(flag: bool) -> String {
    if flag { "YES" } else { "NO" }.to_string()
}

fn intake_fields(n: &IntakeNotice) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("First Name", n.first_name.clone()),
        ("Last Name", n.last_name.clone()),
        ("Date of Birth", n.date_of_birth.clone()),
        ("Email", n.customer_email.clone()),
        ("Phone", n.customer_phone.clone()),
        ("Concerns", n.concerns.join("; ")),
        ("First Time", yes_no(n.is_first_time)),
        (
            "Duration (min)",
            n.duration_minutes.map(|d| d.to_string()).unwrap_or_default(),
        ),
        ("Deposit Required", yes_no(n.deposit_required)),
    ];
    if !n.enquiries.trim().is_empty() {
        fields.push(("Enquiries", n.enquiries.clone()));
    }
    fields
}

/// Renders the operator e-mail for one event.
pub fn render(event: &DomainEvent, settings: &MailSettings) -> OutgoingEmail {
    let (subject, heading, fields) = match event {
        DomainEvent::BookingCreated(n) => (
            format!("[Klinikka] New Appointment Booking - {}", n.appointment_id),
            "New Appointment Booking",
            booking_fields(n),
        ),
        DomainEvent::IntakeSubmitted(n) => (
            format!("[Klinikka] New Appointment - {}", n.reference),
            "New Intake Submitted",
            intake_fields(n),
        ),
    };

    let inline_image = settings.logo.as_ref().map(|bytes| InlineImage {
        content_id: LOGO_CONTENT_ID.to_string(),
        filename: "logo.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: bytes.clone(),
    });

    OutgoingEmail {
        from: settings.from.clone(),
        to: settings.to.clone(),
        subject,
        text_body: text_document(heading, &fields),
        html_body: html_document(heading, &fields, inline_image.is_some()),
        inline_image,
    }
}

/// Sends the e-mail for `event`. Returns whether it was accepted by the transport.
pub async fn deliver(
    notifier: &DynNotifier,
    event: &DomainEvent,
    settings: &MailSettings,
) -> bool {
    let email = render(event, settings);
    match notifier.send_email(email).await {
        Ok(result) => {
            info!(
                "Notification for {} sent to {} (id: {}, status: {})",
                event.reference(),
                settings.to,
                result.id,
                result.status
            );
            true
        }
        Err(err) => {
            warn!(
                "Notification for {} failed, the record is stored regardless: {}",
                event.reference(),
                err
            );
            false
        }
    }
}

/// Delivers events until every publisher is dropped.
pub fn spawn_notifier(
    mut events: UnboundedReceiver<DomainEvent>,
    notifier: DynNotifier,
    settings: MailSettings,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            deliver(&notifier, &event, &settings).await;
        }
        info!("Notification channel closed");
    })
}

/// Transport used when Gmail is disabled: logs instead of sending.
#[derive(Debug, Default, Clone)]
pub struct LoggingNotificationService;

impl NotificationService for LoggingNotificationService {
    type Error = Infallible;

    fn send_email(&self, email: OutgoingEmail) -> BoxFuture<'_, NotificationResult, Self::Error> {
        Box::pin(async move {
            info!(
                "Gmail disabled, not sending '{}' to {}:\n{}",
                email.subject, email.to, email.text_body
            );
            Ok(NotificationResult {
                id: "logged".to_string(),
                status: "skipped".to_string(),
            })
        })
    }
}
