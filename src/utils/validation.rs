//! Utilidades de validación
//! 
//! Funciones helper usadas por los `#[validate(custom = ...)]` de los DTOs
//! y comandos antes de que lleguen a los managers.

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validar que un string no esté vacío
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Mayor valor que admite una columna `NUMERIC(12, 2)`
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

fn check_max_amount(value: &Decimal) -> Result<(), ValidationError> {
    // Postgres redondea a 2 decimales antes de comprobar la precisión
    if value.round_dp(2) > max_amount() {
        let mut error = ValidationError::new("max_amount");
        error.add_param("value".into(), &value.to_string());
        error.add_param("max".into(), &max_amount().to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un decimal no sea negativo y quepa en la columna
pub fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    check_max_amount(value)
}

/// Validar que un decimal sea estrictamente positivo y quepa en la columna
pub fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    check_max_amount(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Depot A").is_ok());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("").is_err());
    }

    #[test]
    fn test_validate_decimals() {
        assert!(validate_non_negative(&dec(0)).is_ok());
        assert!(validate_non_negative(&dec(-5)).is_err());
        assert!(validate_positive(&dec(0)).is_err());
        assert!(validate_positive(&dec(1200)).is_ok());
    }

    #[test]
    fn test_amounts_must_fit_numeric_column() {
        assert!(validate_non_negative(&max_amount()).is_ok());
        assert!(validate_positive(&max_amount()).is_ok());

        let too_large = dec(10_000_000_000);
        assert_eq!(validate_non_negative(&too_large).unwrap_err().code, "max_amount");
        assert_eq!(validate_positive(&too_large).unwrap_err().code, "max_amount");

        // 9999999999.999 se redondea a 10000000000.00
        assert!(validate_non_negative(&Decimal::new(9_999_999_999_999, 3)).is_err());
        assert!(validate_non_negative(&Decimal::new(9_999_999_999_994, 3)).is_ok());
    }
}
