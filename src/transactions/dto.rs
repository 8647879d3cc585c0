use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppError, repo::Transaction, users::dto::PublicUser};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub const AMOUNT_DECIMAL_PLACES: u32 = 2;
pub const AMOUNT_MAX_DIGITS: u32 = 12;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    /// Accepted as a JSON number or a numeric string.
    #[schema(value_type = Option<String>, example = "12.50")]
    pub amount: Option<Value>,
    /// `YYYY-MM-DD`; today (UTC) when absent.
    #[schema(example = "2024-01-31")]
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTransactionRequest {
    #[schema(value_type = Option<String>, example = "12.50")]
    pub amount: Option<Value>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DateRangeRequest {
    #[schema(example = "2024-01-01")]
    pub start_date: Option<String>,
    #[schema(example = "2024-01-31")]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionOutput {
    pub id: Uuid,
    pub user: PublicUser,
    #[schema(value_type = String, example = "12.50")]
    pub amount: Decimal,
    #[serde(with = "iso_date")]
    #[schema(value_type = String, format = Date)]
    pub date: Date,
}

impl TransactionOutput {
    pub fn new(transaction: Transaction, owner: PublicUser) -> Self {
        Self {
            id: transaction.id,
            user: owner,
            amount: transaction.amount,
            date: transaction.date,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionSumOutput {
    #[serde(with = "iso_date::option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<Date>,
    #[serde(with = "iso_date::option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<Date>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub sum: Decimal,
}

/// Turn the raw `amount` field into a money value with exactly two decimal places.
///
/// Absent, `null` and blank values are "missing input"; anything else that is
/// not a number, or that does not fit `NUMERIC(12, 2)`, is a field error.
pub fn parse_amount(raw: Option<&Value>) -> Result<Decimal, AppError> {
    let text = match raw {
        None | Some(Value::Null) => return Err(AppError::missing_input()),
        Some(Value::String(s)) if s.trim().is_empty() => return Err(AppError::missing_input()),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(invalid_amount()),
    };

    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| invalid_amount())?
        .normalize();

    if amount.scale() > AMOUNT_DECIMAL_PLACES {
        return Err(AppError::validation(format!(
            "amount: Ensure that there are no more than {AMOUNT_DECIMAL_PLACES} decimal places."
        )));
    }
    let max = Decimal::from(10u64.pow(AMOUNT_MAX_DIGITS - AMOUNT_DECIMAL_PLACES));
    if amount.abs() >= max {
        return Err(AppError::validation(format!(
            "amount: Ensure that there are no more than {AMOUNT_MAX_DIGITS} digits in total."
        )));
    }

    let mut amount = amount;
    amount.rescale(AMOUNT_DECIMAL_PLACES);
    Ok(amount)
}

fn invalid_amount() -> AppError {
    AppError::validation("amount: A valid number is required.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    fn messages(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation(messages) => messages,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn numbers_and_numeric_strings_are_accepted() {
        assert_eq!(parse_amount(Some(&json!(12.5))).unwrap().to_string(), "12.50");
        assert_eq!(parse_amount(Some(&json!("7"))).unwrap().to_string(), "7.00");
        assert_eq!(parse_amount(Some(&json!(" -3.25 "))).unwrap().to_string(), "-3.25");
        assert_eq!(parse_amount(Some(&json!(0))).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn missing_values_are_reported_as_missing_input() {
        for raw in [None, Some(json!(null)), Some(json!("")), Some(json!("  "))] {
            let err = parse_amount(raw.as_ref()).unwrap_err();
            assert_eq!(messages(err), vec!["Forgot to enter something!".to_string()]);
        }
    }

    #[test]
    fn garbage_and_overly_precise_amounts_are_rejected() {
        assert!(parse_amount(Some(&json!("ten"))).is_err());
        assert!(parse_amount(Some(&json!(true))).is_err());
        assert!(parse_amount(Some(&json!([1]))).is_err());

        let err = parse_amount(Some(&json!("1.005"))).unwrap_err();
        assert!(messages(err)[0].contains("2 decimal places"));

        let err = parse_amount(Some(&json!("10000000000"))).unwrap_err();
        assert!(messages(err)[0].contains("12 digits"));
        assert!(parse_amount(Some(&json!("9999999999.99"))).is_ok());
    }

    #[test]
    fn sum_output_uses_iso_dates_and_a_numeric_sum() {
        let output = TransactionSumOutput {
            start_date: Some(date!(2024 - 01 - 05)),
            end_date: None,
            sum: Decimal::new(1050, 2),
        };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["start_date"], "2024-01-05");
        assert!(value["end_date"].is_null());
        assert_eq!(value["sum"], json!(10.5));
    }
}
