use crate::utils::error::{Result, SyncError};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(SyncError::ValidationError {
            field: field_name.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(SyncError::ValidationError {
                field: field_name.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(SyncError::ValidationError {
            field: field_name.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SyncError::ValidationError {
            field: field_name.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Shape check only; the API is the authority on deliverability.
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

pub fn validate_email(field_name: &str, address: &str) -> Result<()> {
    if !email_regex().is_match(address) {
        return Err(SyncError::ValidationError {
            field: field_name.to_string(),
            reason: format!("`{}` is not a valid email address", address),
        });
    }
    Ok(())
}

pub fn validate_positive_id(field_name: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(SyncError::ValidationError {
            field: field_name.to_string(),
            reason: "Id must be a positive integer".to_string(),
        });
    }
    Ok(())
}
