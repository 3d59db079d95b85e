use rstest::rstest;

use crate::error::AppError;

#[rstest]
#[case(AppError::Unauthorized(String::new()), 401, "UNAUTHORIZED")]
#[case(AppError::Forbidden(String::new()), 403, "FORBIDDEN")]
#[case(AppError::NotFound(String::new()), 404, "NOT_FOUND")]
#[case(AppError::Validation(String::new()), 400, "VALIDATION_ERROR")]
#[case(AppError::Conflict(String::new()), 409, "CONFLICT")]
#[case(AppError::Configuration(String::new()), 500, "CONFIGURATION_ERROR")]
#[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
#[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
fn test_error_mapping(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
    assert_eq!(err.status_code(), status);
    assert_eq!(err.error_code(), code);
    assert_eq!(err.is_opaque(), status >= 500);
}

#[test]
fn test_error_display() {
    assert_eq!(
        AppError::Unauthorized("msg".into()).to_string(),
        "Authentication failed: msg"
    );
    assert_eq!(
        AppError::Conflict("msg".into()).to_string(),
        "Conflict: msg"
    );
    assert_eq!(
        AppError::Configuration("msg".into()).to_string(),
        "Configuration error: msg"
    );
}
