use crate::errors::FieldError;

/// Trimmed value of a required text field; records an error when missing or blank.
pub fn required_text(
    field: &'static str,
    value: Option<String>,
    errors: &mut Vec<FieldError>,
) -> String {
    match optional_text(value) {
        Some(v) => v,
        None => {
            errors.push(FieldError::new(field, "is required"));
            String::new()
        }
    }
}

pub fn required_email(
    field: &'static str,
    value: Option<String>,
    errors: &mut Vec<FieldError>,
) -> String {
    match optional_text(value) {
        Some(v) if is_plausible_email(&v) => v.to_lowercase(),
        Some(v) => {
            errors.push(FieldError::new(field, "is not a valid email address"));
            v
        }
        None => {
            errors.push(FieldError::new(field, "is required"));
            String::new()
        }
    }
}

/// Blank strings collapse to `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_plausible_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}
