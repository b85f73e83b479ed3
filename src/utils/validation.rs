use crate::domain::model::UserProfile;
use crate::utils::error::{Result, SwapError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(SwapError::ValidationError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SwapError::ValidationError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| SwapError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SwapError::ValidationError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    // NaN fails both comparisons, so check containment rather than exclusion
    if !(value >= min && value <= max) {
        return Err(SwapError::ValidationError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

impl Validate for UserProfile {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("user.id", &self.id)?;
        validate_non_empty_string("user.name", &self.name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("storage.data_file", "data.json").is_ok());
        assert!(validate_path("storage.data_file", "  ").is_err());
        assert!(validate_path("storage.data_file", "a\0b").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("matching.min_score", 40.0, 0.0, 100.0).is_ok());
        assert!(validate_range("matching.min_score", 100.5, 0.0, 100.0).is_err());
        assert!(validate_range("matching.min_score", f64::NAN, 0.0, 100.0).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some(3);
        assert_eq!(*validate_required_field("top", &present).unwrap(), 3);
        let absent: Option<u32> = None;
        assert!(matches!(
            validate_required_field("top", &absent),
            Err(SwapError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_profile_needs_a_name() {
        let user = UserProfile::new("  ", "x@example.com");
        assert!(user.validate().is_err());
        assert!(UserProfile::new("Ana", "").validate().is_ok());
    }
}
