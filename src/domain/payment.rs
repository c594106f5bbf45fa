use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A strictly positive monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::ValidationError(
                "amount must be greater than zero".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Number of units bought in a single payment. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: i64) -> Result<Self, PaymentError> {
        if value < 1 {
            return Err(PaymentError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }
        u32::try_from(value).map(Self).map_err(|_| {
            PaymentError::ValidationError(format!("quantity {value} is out of range"))
        })
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = PaymentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

/// Raw input to the workflow. Nothing here has been validated yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub user_id: u64,
    pub item_id: u64,
    pub amount: Decimal,
    pub quantity: i64,
}

impl PaymentRequest {
    pub fn new(user_id: u64, item_id: u64, amount: Decimal, quantity: i64) -> Self {
        Self {
            user_id,
            item_id,
            amount,
            quantity,
        }
    }

    /// Checks the request and stamps it with its creation time.
    pub fn validate(&self, created_at: DateTime<Utc>) -> Result<NewPayment, PaymentError> {
        Ok(NewPayment {
            user_id: self.user_id,
            item_id: self.item_id,
            amount: Amount::new(self.amount)?,
            quantity: Quantity::new(self.quantity)?,
            created_at,
        })
    }
}

/// A validated payment waiting for the store to assign it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub user_id: u64,
    pub item_id: u64,
    pub amount: Amount,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
}

impl NewPayment {
    pub fn into_record(self, id: u64) -> PaymentRecord {
        PaymentRecord {
            id,
            user_id: self.user_id,
            item_id: self.item_id,
            amount: self.amount,
            quantity: self.quantity,
            created_at: self.created_at,
        }
    }
}

/// A committed payment. Owned by the store once it has been handed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: u64,
    pub user_id: u64,
    pub item_id: u64,
    pub amount: Amount,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn total(&self) -> Decimal {
        self.amount.value() * Decimal::from(self.quantity.value())
    }

    pub fn details(&self) -> PaymentDetails {
        PaymentDetails {
            payment_id: self.id,
            user_id: self.user_id,
            item_id: self.item_id,
            amount: self.amount.value(),
            quantity: self.quantity.value(),
            total: self.total(),
            created_at: self.created_at,
        }
    }

    pub fn view(&self) -> PaymentView {
        PaymentView {
            id: self.id,
            user_id: self.user_id,
            item_id: self.item_id,
            amount: self.amount.value(),
            quantity: self.quantity.value(),
            created_at: self.created_at,
        }
    }
}

/// Projection of a committed payment posted to the notification endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub payment_id: u64,
    pub user_id: u64,
    pub item_id: u64,
    pub amount: Decimal,
    pub quantity: u32,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Caller-facing view of a committed payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentView {
    pub id: u64,
    pub user_id: u64,
    pub item_id: u64,
    pub amount: Decimal,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}
