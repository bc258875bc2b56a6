use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, FieldErrors};

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 15)]
    pub per_page: u64,
    /// Total number of items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 4)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// Page selection for admin listings.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Page number (default: 1).
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Items per page (1-100, default depends on the listing).
    #[param(example = 15)]
    pub per_page: Option<u64>,
}

impl ListQuery {
    /// Normalized `(page, per_page)`.
    pub fn window(&self, default_per_page: u64) -> (u64, u64) {
        let page = Ord::max(self.page.unwrap_or(1), 1);
        let per_page = self.per_page.unwrap_or(default_per_page).clamp(1, 100);
        (page, per_page)
    }

    /// Rows to skip for `page`, saturating instead of overflowing and kept
    /// within the signed range SQL backends accept.
    pub fn offset(page: u64, per_page: u64) -> u64 {
        page.saturating_sub(1)
            .saturating_mul(per_page)
            .min(i64::MAX as u64)
    }
}

/// Trim a submitted string; blank input counts as absent.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accept the loose boolean spellings admin forms send: `true`/`false`,
/// `1`/`0`, `"1"`/`"0"`, `"true"`/`"false"`.
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Collects per-field failures so a request reports every bad field at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure; the first message per field wins.
    pub fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn has(&self, field: &'static str) -> bool {
        self.errors.contains_key(field)
    }

    /// Required trimmed string of at most `max` characters.
    pub fn required(&mut self, field: &'static str, value: Option<&str>, max: usize) {
        match value {
            None => self.fail(field, format!("The {field} field is required.")),
            Some(v) => self.max_len(field, v, max),
        }
    }

    /// Optional string of at most `max` characters.
    pub fn optional(&mut self, field: &'static str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            self.max_len(field, v, max);
        }
    }

    fn max_len(&mut self, field: &'static str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.fail(
                field,
                format!("The {field} field must not be greater than {max} characters."),
            );
        }
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(self.errors))
        }
    }
}
