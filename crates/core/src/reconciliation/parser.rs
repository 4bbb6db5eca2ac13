//! Transfer-notification email parsing.
//!
//! The bank's notification mails are semi-structured text; extraction works
//! off pattern tables so new bank formats only add patterns. An email that
//! yields no positive amount is not a transfer notification and is rejected
//! by the pipeline without a record.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::reconciliation_model::TransferNotice;
use crate::ledger::content_fingerprint;

/// Subject/body keywords that mark a message as a transfer notification.
const TRANSFER_KEYWORDS: &[&str] = &[
    "transfer notification",
    "deposit notification",
    "incoming transfer",
    "funds received",
    "remittance advice",
    "credit advice",
    "deposit confirmation",
];

lazy_static! {
    /// Amount extraction patterns, tried in order.
    static ref AMOUNT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)transfer amount[:：]\s*(?:NT|US)?\$?\s*([0-9][0-9,]*(?:\.[0-9]+)?)")
            .expect("Invalid regex pattern"),
        Regex::new(r"(?i)amount[:：]\s*(?:NT|US)?\$?\s*([0-9][0-9,]*(?:\.[0-9]+)?)")
            .expect("Invalid regex pattern"),
        Regex::new(r"(?i)deposited[:：]?\s*(?:NT|US)?\$?\s*([0-9][0-9,]*(?:\.[0-9]+)?)")
            .expect("Invalid regex pattern"),
        Regex::new(r"(?i)credited[:：]?\s*(?:NT|US)?\$?\s*([0-9][0-9,]*(?:\.[0-9]+)?)")
            .expect("Invalid regex pattern"),
    ];

    /// Transaction id patterns, tried in order.
    static ref TRANSFER_ID_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)transaction\s+id[:：]\s*([A-Za-z0-9-]+)").expect("Invalid regex pattern"),
        Regex::new(r"(?i)reference\s+(?:no|number)[:：]\s*([A-Za-z0-9-]+)")
            .expect("Invalid regex pattern"),
        Regex::new(r"(?i)reference[:：]\s*([A-Za-z0-9-]+)").expect("Invalid regex pattern"),
        Regex::new(r"(?i)serial\s+(?:no|number)[:：]\s*([A-Za-z0-9-]+)")
            .expect("Invalid regex pattern"),
    ];

    /// Group code embedded by the sender in the transfer memo.
    static ref GROUP_CODE_PATTERN: Regex =
        Regex::new(r"(?i)GROUP[-_]([A-Za-z0-9]+)").expect("Invalid regex pattern");

    /// Transfer timestamp patterns.
    static ref TRANSFER_TIME_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)transfer\s+time[:：]\s*(\d{4}[-/]\d{2}[-/]\d{2}\s+\d{2}:\d{2})")
            .expect("Invalid regex pattern"),
        Regex::new(r"(?i)transaction\s+time[:：]\s*(\d{4}[-/]\d{2}[-/]\d{2}\s+\d{2}:\d{2})")
            .expect("Invalid regex pattern"),
        Regex::new(r"(?i)time[:：]\s*(\d{4}[-/]\d{2}[-/]\d{2}\s+\d{2}:\d{2})")
            .expect("Invalid regex pattern"),
    ];
}

/// Whether the message looks like a bank transfer notification at all.
pub fn is_transfer_notification(subject: &str, sender: &str, body: &str) -> bool {
    let haystack = format!("{} {} {}", subject, sender, body).to_lowercase();
    TRANSFER_KEYWORDS
        .iter()
        .any(|keyword| haystack.contains(keyword))
}

/// Extracts transfer details from a notification email.
///
/// Returns `None` when the message is not a recognizable transfer
/// notification or carries no positive amount. A missing transaction id is
/// replaced by a deterministic content fingerprint so a refetch of the same
/// email resolves to the same transfer id.
pub fn parse_transfer_notice(subject: &str, sender: &str, body: &str) -> Option<TransferNotice> {
    if !is_transfer_notification(subject, sender, body) {
        return None;
    }

    let full_text = format!("{}\n{}", subject, body);

    let amount = extract_amount(&full_text)?;
    if amount <= Decimal::ZERO {
        return None;
    }

    let transfer_id = extract_transfer_id(&full_text)
        .unwrap_or_else(|| content_fingerprint(&full_text));

    let group_code = GROUP_CODE_PATTERN
        .captures(&full_text)
        .map(|c| c[1].to_uppercase());

    let transfer_time = extract_transfer_time(&full_text);

    Some(TransferNotice {
        amount,
        transfer_id,
        group_code,
        transfer_time,
    })
}

fn extract_amount(text: &str) -> Option<Decimal> {
    for pattern in AMOUNT_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            let raw = captures[1].replace(',', "");
            if let Ok(amount) = Decimal::from_str(&raw) {
                return Some(amount);
            }
        }
    }
    None
}

fn extract_transfer_id(text: &str) -> Option<String> {
    for pattern in TRANSFER_ID_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            return Some(captures[1].to_uppercase());
        }
    }
    None
}

fn extract_transfer_time(text: &str) -> Option<DateTime<Utc>> {
    for pattern in TRANSFER_TIME_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            let normalized = captures[1].replace('/', "-");
            if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M") {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }
    }
    None
}
