use demand_forecast::data::Weather;
use demand_forecast::ForecastError;
use demand_math::MathError;
use std::io;

#[test]
fn test_error_display() {
    let err = ForecastError::ValidationError("Cannot train on an empty corpus".to_string());
    assert_eq!(
        err.to_string(),
        "Validation error: Cannot train on an empty corpus"
    );

    let err = ForecastError::SchemaMismatch {
        expected: "aaaa0000".to_string(),
        found: "bbbb1111".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Schema mismatch: bundle was trained with schema bbbb1111, this build produces aaaa0000"
    );
}

#[test]
fn test_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err: ForecastError = io_err.into();
    assert!(matches!(err, ForecastError::IoError(_)));

    let math_err = MathError::InsufficientData("no rows".to_string());
    let err: ForecastError = math_err.into();
    assert!(matches!(err, ForecastError::ModelError(_)));
    assert!(err.to_string().contains("no rows"));

    let json_err = serde_json::from_str::<u32>("x").unwrap_err();
    let err: ForecastError = json_err.into();
    assert!(matches!(err, ForecastError::SerializationError(_)));
}

#[test]
fn test_unknown_label_is_data_error() {
    let err = "Snowy".parse::<Weather>().unwrap_err();
    assert!(matches!(err, ForecastError::DataError(_)));
    assert_eq!(err.to_string(), "Data error: Unknown weather 'Snowy'");
}
