//! RFC 2822 message assembly for the Gmail `raw` field.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use klinik_common::services::OutgoingEmail;

const CRLF: &str = "\r\n";
const LINE_WIDTH: usize = 76;

/// Header values never carry line breaks.
fn header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// RFC 2047 encoded-word for non-ASCII subjects.
fn encode_subject(subject: &str) -> String {
    let subject = header_value(subject);
    if subject.is_ascii() {
        subject
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(subject.as_bytes()))
    }
}

/// Base64 body wrapped at 76 columns.
fn encode_body(bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(bytes);
    encoded
        .as_bytes()
        .chunks(LINE_WIDTH)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(CRLF)
}

fn text_part(out: &mut String, boundary: &str, subtype: &str, body: &str) {
    out.push_str(&format!("--{}{}", boundary, CRLF));
    out.push_str(&format!("Content-Type: text/{}; charset=\"UTF-8\"{}", subtype, CRLF));
    out.push_str(&format!("Content-Transfer-Encoding: base64{}{}", CRLF, CRLF));
    out.push_str(&encode_body(body.as_bytes()));
    out.push_str(CRLF);
}

fn alternative(out: &mut String, boundary: &str, email: &OutgoingEmail) {
    text_part(out, boundary, "plain", &email.text_body);
    text_part(out, boundary, "html", &email.html_body);
    out.push_str(&format!("--{}--{}", boundary, CRLF));
}

/// Builds the full message. With an inline image the plain/HTML alternative is
/// wrapped in `multipart/related` so the HTML can reference `cid:<content_id>`.
pub fn build_mime(email: &OutgoingEmail, boundary_seed: &str) -> String {
    let alt_boundary = format!("alt_{}", boundary_seed);
    let rel_boundary = format!("rel_{}", boundary_seed);

    let mut out = String::new();
    out.push_str(&format!("From: {}{}", header_value(&email.from), CRLF));
    out.push_str(&format!("To: {}{}", header_value(&email.to), CRLF));
    out.push_str(&format!("Subject: {}{}", encode_subject(&email.subject), CRLF));
    out.push_str(&format!("MIME-Version: 1.0{}", CRLF));

    match &email.inline_image {
        None => {
            out.push_str(&format!(
                "Content-Type: multipart/alternative; boundary=\"{}\"{}{}",
                alt_boundary, CRLF, CRLF
            ));
            alternative(&mut out, &alt_boundary, email);
        }
        Some(image) => {
            out.push_str(&format!(
                "Content-Type: multipart/related; boundary=\"{}\"{}{}",
                rel_boundary, CRLF, CRLF
            ));
            out.push_str(&format!("--{}{}", rel_boundary, CRLF));
            out.push_str(&format!(
                "Content-Type: multipart/alternative; boundary=\"{}\"{}{}",
                alt_boundary, CRLF, CRLF
            ));
            alternative(&mut out, &alt_boundary, email);

            let filename = header_value(&image.filename);
            out.push_str(&format!("--{}{}", rel_boundary, CRLF));
            out.push_str(&format!(
                "Content-Type: {}; name=\"{}\"{}",
                header_value(&image.content_type),
                filename,
                CRLF
            ));
            out.push_str(&format!("Content-Transfer-Encoding: base64{}", CRLF));
            out.push_str(&format!(
                "Content-ID: <{}>{}",
                header_value(&image.content_id),
                CRLF
            ));
            out.push_str(&format!(
                "Content-Disposition: inline; filename=\"{}\"{}{}",
                filename, CRLF, CRLF
            ));
            out.push_str(&encode_body(&image.bytes));
            out.push_str(CRLF);
            out.push_str(&format!("--{}--{}", rel_boundary, CRLF));
        }
    }
    out
}

/// The `raw` value Gmail expects: the whole message, base64url without padding.
pub fn encode_raw(message: &str) -> String {
    URL_SAFE_NO_PAD.encode(message.as_bytes())
}
