//! Transaction, filter and query result types exchanged with the transaction API

use crate::error::{CoreError, CoreResult};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use txconsole_config::{FilterConfig, PageSize};

/// Maximum page size honoured by the transaction API
pub const MAX_PAGE_SIZE: usize = 250;

// ==================== Transaction ====================

/// A bank transaction record as served by the transaction API
///
/// Every field except `id` may be missing from a response and then takes its
/// default value. Money fields travel as JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: u64,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub credit_limit: Decimal,
    #[serde(default)]
    pub available_money: Decimal,
    #[serde(default)]
    pub transaction_date_time: String,
    #[serde(default)]
    pub transaction_amount: Decimal,
    #[serde(default)]
    pub merchant_name: String,
    #[serde(default)]
    pub acq_country: String,
    #[serde(default)]
    pub merchant_country_code: String,
    #[serde(default)]
    pub pos_entry_mode: String,
    #[serde(default)]
    pub pos_condition_code: u32,
    #[serde(default)]
    pub merchant_category_code: String,
    #[serde(default)]
    pub current_exp_date: String,
    #[serde(default)]
    pub account_open_date: String,
    #[serde(default)]
    pub date_of_last_address_change: String,
    #[serde(default, rename = "cardCVV")]
    pub card_cvv: u32,
    #[serde(default, rename = "cardLast4Digits")]
    pub card_last4_digits: u32,
    #[serde(default)]
    pub transaction_type: String,
    #[serde(default)]
    pub current_balance: Decimal,
    #[serde(default)]
    pub card_present: String,
    #[serde(default)]
    pub is_fraud: String,
    #[serde(default)]
    pub country_code: String,
}

impl Transaction {
    /// Check if the record is flagged as fraudulent
    pub fn is_flagged_fraud(&self) -> bool {
        self.is_fraud.eq_ignore_ascii_case("TRUE")
    }

    /// Soft-delete status label
    pub fn status_label(&self) -> &'static str {
        if self.deleted {
            "Deleted"
        } else {
            "Active"
        }
    }
}

/// Parse the date/time formats used by the API and by `datetime-local` inputs
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ==================== Editable Fields ====================

/// Fields of a transaction the detail editor can change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionField {
    TransactionDateTime,
    AccountNumber,
    CustomerId,
    MerchantName,
    AcqCountry,
    MerchantCountryCode,
    MerchantCategoryCode,
    AccountOpenDate,
    DateOfLastAddressChange,
    CardLast4Digits,
    CardCvv,
    TransactionType,
    CardPresent,
    IsFraud,
    CreditLimit,
    AvailableMoney,
    TransactionAmount,
}

/// How a field is presented in the editor form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    DateTime,
    Digits,
    Money,
    Flag,
}

impl TransactionField {
    /// All editable fields in form order
    pub const ALL: [TransactionField; 17] = [
        TransactionField::TransactionDateTime,
        TransactionField::AccountNumber,
        TransactionField::CustomerId,
        TransactionField::MerchantName,
        TransactionField::AcqCountry,
        TransactionField::MerchantCountryCode,
        TransactionField::MerchantCategoryCode,
        TransactionField::AccountOpenDate,
        TransactionField::DateOfLastAddressChange,
        TransactionField::CardLast4Digits,
        TransactionField::CardCvv,
        TransactionField::TransactionType,
        TransactionField::CardPresent,
        TransactionField::IsFraud,
        TransactionField::CreditLimit,
        TransactionField::AvailableMoney,
        TransactionField::TransactionAmount,
    ];

    /// JSON / form field name
    pub fn wire_name(self) -> &'static str {
        match self {
            TransactionField::TransactionDateTime => "transactionDateTime",
            TransactionField::AccountNumber => "accountNumber",
            TransactionField::CustomerId => "customerId",
            TransactionField::MerchantName => "merchantName",
            TransactionField::AcqCountry => "acqCountry",
            TransactionField::MerchantCountryCode => "merchantCountryCode",
            TransactionField::MerchantCategoryCode => "merchantCategoryCode",
            TransactionField::AccountOpenDate => "accountOpenDate",
            TransactionField::DateOfLastAddressChange => "dateOfLastAddressChange",
            TransactionField::CardLast4Digits => "cardLast4Digits",
            TransactionField::CardCvv => "cardCVV",
            TransactionField::TransactionType => "transactionType",
            TransactionField::CardPresent => "cardPresent",
            TransactionField::IsFraud => "isFraud",
            TransactionField::CreditLimit => "creditLimit",
            TransactionField::AvailableMoney => "availableMoney",
            TransactionField::TransactionAmount => "transactionAmount",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransactionField::TransactionDateTime => "Transaction Date / Time",
            TransactionField::AccountNumber => "Account Number",
            TransactionField::CustomerId => "Customer ID",
            TransactionField::MerchantName => "Merchant Name",
            TransactionField::AcqCountry => "Acquisition Country",
            TransactionField::MerchantCountryCode => "Merchant Country",
            TransactionField::MerchantCategoryCode => "Merchant Category Code",
            TransactionField::AccountOpenDate => "Account Open Date",
            TransactionField::DateOfLastAddressChange => "Date of Last Address Change",
            TransactionField::CardLast4Digits => "Card Last 4 Digits",
            TransactionField::CardCvv => "CVV",
            TransactionField::TransactionType => "Transaction Type",
            TransactionField::CardPresent => "Card Present",
            TransactionField::IsFraud => "Is Fraudulent",
            TransactionField::CreditLimit => "Credit Limit",
            TransactionField::AvailableMoney => "Available Money",
            TransactionField::TransactionAmount => "Transaction Amount",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            TransactionField::TransactionDateTime
            | TransactionField::AccountOpenDate
            | TransactionField::DateOfLastAddressChange => FieldKind::DateTime,
            TransactionField::CardLast4Digits | TransactionField::CardCvv => FieldKind::Digits,
            TransactionField::CardPresent | TransactionField::IsFraud => FieldKind::Flag,
            TransactionField::CreditLimit
            | TransactionField::AvailableMoney
            | TransactionField::TransactionAmount => FieldKind::Money,
            _ => FieldKind::Text,
        }
    }

    /// Current value of this field rendered as form text
    pub fn value_of(self, tx: &Transaction) -> String {
        match self {
            TransactionField::TransactionDateTime => tx.transaction_date_time.clone(),
            TransactionField::AccountNumber => tx.account_number.clone(),
            TransactionField::CustomerId => tx.customer_id.clone(),
            TransactionField::MerchantName => tx.merchant_name.clone(),
            TransactionField::AcqCountry => tx.acq_country.clone(),
            TransactionField::MerchantCountryCode => tx.merchant_country_code.clone(),
            TransactionField::MerchantCategoryCode => tx.merchant_category_code.clone(),
            TransactionField::AccountOpenDate => tx.account_open_date.clone(),
            TransactionField::DateOfLastAddressChange => tx.date_of_last_address_change.clone(),
            TransactionField::CardLast4Digits => format!("{:04}", tx.card_last4_digits),
            TransactionField::CardCvv => format!("{:03}", tx.card_cvv),
            TransactionField::TransactionType => tx.transaction_type.clone(),
            TransactionField::CardPresent => tx.card_present.clone(),
            TransactionField::IsFraud => tx.is_fraud.clone(),
            TransactionField::CreditLimit => tx.credit_limit.to_string(),
            TransactionField::AvailableMoney => tx.available_money.to_string(),
            TransactionField::TransactionAmount => tx.transaction_amount.to_string(),
        }
    }

    /// Apply form text to `tx`, coercing it into the field's type
    pub fn apply(self, tx: &mut Transaction, raw: &str) -> CoreResult<()> {
        let value = raw.trim();
        match self {
            TransactionField::TransactionDateTime => tx.transaction_date_time = self.datetime(value)?,
            TransactionField::AccountOpenDate => tx.account_open_date = self.datetime(value)?,
            TransactionField::DateOfLastAddressChange => {
                tx.date_of_last_address_change = self.datetime(value)?
            }
            TransactionField::AccountNumber => tx.account_number = value.to_string(),
            TransactionField::CustomerId => tx.customer_id = value.to_string(),
            TransactionField::MerchantName => tx.merchant_name = raw.to_string(),
            TransactionField::AcqCountry => tx.acq_country = self.country(value)?,
            TransactionField::MerchantCountryCode => tx.merchant_country_code = self.country(value)?,
            TransactionField::MerchantCategoryCode => tx.merchant_category_code = value.to_lowercase(),
            TransactionField::TransactionType => tx.transaction_type = value.to_uppercase(),
            TransactionField::CardLast4Digits => tx.card_last4_digits = self.digits(value)?,
            TransactionField::CardCvv => tx.card_cvv = self.digits(value)?,
            TransactionField::CardPresent => tx.card_present = self.flag(value)?,
            TransactionField::IsFraud => tx.is_fraud = self.flag(value)?,
            TransactionField::CreditLimit => tx.credit_limit = self.money(value)?,
            TransactionField::AvailableMoney => tx.available_money = self.money(value)?,
            TransactionField::TransactionAmount => tx.transaction_amount = self.money(value)?,
        }
        Ok(())
    }

    fn invalid(self, reason: impl Into<String>) -> CoreError {
        CoreError::InvalidField {
            field: self.wire_name().to_string(),
            reason: reason.into(),
        }
    }

    fn datetime(self, value: &str) -> CoreResult<String> {
        if value.is_empty() || parse_datetime(value).is_some() {
            Ok(value.to_string())
        } else {
            Err(self.invalid(format!("'{}' is not a date/time", value)))
        }
    }

    fn country(self, value: &str) -> CoreResult<String> {
        if value.chars().all(|c| c.is_ascii_alphabetic()) && value.len() <= 3 {
            Ok(value.to_uppercase())
        } else {
            Err(self.invalid("Country codes are 2 or 3 letters"))
        }
    }

    fn digits(self, value: &str) -> CoreResult<u32> {
        if value.is_empty() {
            return Ok(0);
        }
        if value.len() > 4 || !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(self.invalid("Expected up to 4 digits"));
        }
        value.parse().map_err(|_| self.invalid("Expected up to 4 digits"))
    }

    fn flag(self, value: &str) -> CoreResult<String> {
        match value.to_uppercase().as_str() {
            "TRUE" => Ok("TRUE".to_string()),
            "FALSE" => Ok("FALSE".to_string()),
            _ => Err(self.invalid("Expected TRUE or FALSE")),
        }
    }

    fn money(self, value: &str) -> CoreResult<Decimal> {
        if value.is_empty() {
            return Ok(Decimal::ZERO);
        }
        value
            .replace(',', "")
            .parse::<Decimal>()
            .map_err(|_| self.invalid(format!("'{}' is not a number", value)))
    }
}

impl std::str::FromStr for TransactionField {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionField::ALL
            .into_iter()
            .find(|f| f.wire_name() == s)
            .ok_or_else(|| CoreError::UnknownField { field: s.to_string() })
    }
}

impl std::fmt::Display for TransactionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

// ==================== Filter ====================

/// Query filter held by a console session
///
/// Serializes into the query parameters of `GET /transactions`; an absent
/// day means "all days" and an absent token requests the first page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub year: i32,
    pub month: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    pub is_fraud: bool,
    pub page_size: PageSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_token: Option<String>,
}

impl Filter {
    /// Initial filter of a new session
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            year: config.default_year,
            month: config.default_month,
            day: None,
            is_fraud: config.default_is_fraud,
            page_size: config.default_page_size,
            pagination_token: None,
        }
    }

    /// Same filter asking for the page after `token`
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            pagination_token: Some(token.into()),
            ..self.clone()
        }
    }

    /// Same filter asking for the first page
    pub fn first_page(&self) -> Self {
        Self {
            pagination_token: None,
            ..self.clone()
        }
    }

    /// `transactionDateTime` prefix matched by this filter, e.g. `2016-02-` or `2016-02-09`
    pub fn date_prefix(&self) -> String {
        match self.day {
            Some(day) => format!("{:04}-{:02}-{:02}", self.year, self.month, day),
            None => format!("{:04}-{:02}-", self.year, self.month),
        }
    }
}

/// Raw filter editor form, every field as submitted by the browser
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterForm {
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub is_fraud: String,
    #[serde(default)]
    pub page_size: String,
}

impl FilterForm {
    /// Build a complete replacement filter
    ///
    /// A day that does not exist in the selected month resets to all days.
    pub fn into_filter(self, start_year: i32, current_year: i32) -> CoreResult<Filter> {
        let year: i32 = self.year.trim().parse().map_err(|_| CoreError::ValidationError {
            message: format!("Invalid year: {}", self.year),
        })?;
        if year < start_year || year > current_year {
            return Err(CoreError::ValidationError {
                message: format!("Year must be between {} and {}", start_year, current_year),
            });
        }

        let month: u32 = self.month.trim().parse().map_err(|_| CoreError::ValidationError {
            message: format!("Invalid month: {}", self.month),
        })?;
        if !(1..=12).contains(&month) {
            return Err(CoreError::ValidationError {
                message: format!("Invalid month: {}", month),
            });
        }

        let day = match self.day.trim() {
            "" => None,
            text => {
                let day: u32 = text.parse().map_err(|_| CoreError::ValidationError {
                    message: format!("Invalid day: {}", text),
                })?;
                let last = crate::time::days_in_month(month, year).len() as u32;
                (1..=last).contains(&day).then_some(day)
            }
        };

        let is_fraud = match self.is_fraud.trim() {
            "true" => true,
            "false" | "" => false,
            other => {
                return Err(CoreError::ValidationError {
                    message: format!("Invalid fraud flag: {}", other),
                })
            }
        };

        let page_size: PageSize = self
            .page_size
            .parse()
            .map_err(|message| CoreError::ValidationError { message })?;

        Ok(Filter {
            year,
            month,
            day,
            is_fraud,
            page_size,
            pagination_token: None,
        })
    }
}

// ==================== Query Result ====================

/// One page of transactions returned by the transaction API
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub items: Vec<Transaction>,
    #[serde(default)]
    pub count: usize,
    /// Continuation token; the API sends an empty string on the last page
    #[serde(
        default,
        deserialize_with = "token_from_wire",
        serialize_with = "token_to_wire"
    )]
    pub pagination_token: Option<String>,
}

impl QueryResult {
    pub fn has_more(&self) -> bool {
        self.pagination_token.is_some()
    }
}

fn token_from_wire<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let token = Option::<String>::deserialize(deserializer)?;
    Ok(token.filter(|t| !t.is_empty()))
}

fn token_to_wire<S>(token: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(token.as_deref().unwrap_or(""))
}

#[cfg(test)]
pub(crate) fn sample_transaction(id: u64) -> Transaction {
    Transaction {
        id,
        deleted: false,
        account_number: "737265056".to_string(),
        customer_id: "737265056".to_string(),
        credit_limit: Decimal::new(5000, 0),
        available_money: Decimal::new(500000, 2),
        transaction_date_time: "2016-02-09T20:11:40".to_string(),
        transaction_amount: Decimal::new(9877, 2),
        merchant_name: "Uber".to_string(),
        acq_country: "US".to_string(),
        merchant_country_code: "US".to_string(),
        pos_entry_mode: "02".to_string(),
        pos_condition_code: 1,
        merchant_category_code: "rideshare".to_string(),
        current_exp_date: "06/2023".to_string(),
        account_open_date: "2015-03-14".to_string(),
        date_of_last_address_change: "2015-03-14".to_string(),
        card_cvv: 414,
        card_last4_digits: 1803,
        transaction_type: "PURCHASE".to_string(),
        current_balance: Decimal::ZERO,
        card_present: "FALSE".to_string(),
        is_fraud: "TRUE".to_string(),
        country_code: "US".to_string(),
    }
}
