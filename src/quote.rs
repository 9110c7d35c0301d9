//! Quote submission
//!
//! Assembly of the structured payload handed to the mail-submission
//! endpoint: customer contact details, the in-progress product, the
//! flattened customizations and a full basket snapshot. Delivery is the
//! endpoint's concern; a failed submission leaves every piece of state here
//! untouched and resubmittable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::{basket::{Basket, BasketLine}, customization::Customization, ledger::PositionLedger};

/// Errors raised while validating a quote for submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuoteError {
    /// A required contact field is empty.
    #[error("required field {0} is empty")]
    MissingField(&'static str),

    /// The email address is not valid.
    #[error("invalid email address")]
    InvalidEmail,

    /// The terms and returns policies were not both accepted.
    #[error("terms and returns policies must be accepted")]
    PoliciesNotAccepted,
}

/// Customer contact details from the quote form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CustomerDetails {
    /// First name.
    #[serde(rename = "firstName")]
    pub first_name: String,
    /// Last name.
    #[serde(rename = "lastName")]
    pub last_name: String,
    /// Email address.
    #[validate(email)]
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Country.
    pub country: String,
    /// County or state.
    pub state: String,
    /// Postcode.
    pub postcode: String,
    /// Whether the terms and conditions were accepted.
    #[serde(rename = "termsAccepted")]
    pub terms_accepted: bool,
    /// Whether the returns policy was accepted.
    #[serde(rename = "returnsAccepted")]
    pub returns_accepted: bool,
    /// Newsletter opt-in.
    pub newsletter: bool,
    /// GDPR consent.
    pub gdpr: bool,
    /// Chosen shipping option.
    pub shipping: String,
}

impl CustomerDetails {
    /// Validate the details for submission.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: a missing required field, an
    /// invalid email, or unaccepted policies.
    pub fn validate_for_submission(&self) -> Result<(), QuoteError> {
        let required: [(&'static str, &str); 7] = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("postcode", &self.postcode),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(QuoteError::MissingField(field));
            }
        }

        if self.validate().is_err() {
            return Err(QuoteError::InvalidEmail);
        }

        if !(self.terms_accepted && self.returns_accepted) {
            return Err(QuoteError::PoliciesNotAccepted);
        }

        Ok(())
    }
}

/// The structured quote payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotePayload {
    /// Customer contact details.
    pub customer: CustomerDetails,
    /// The in-progress product configuration, if one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<BasketLine>,
    /// Customizations flattened out of the ledger, in selection order.
    pub customizations: Vec<Customization>,
    /// Full basket snapshot.
    pub basket: Basket,
    /// Submission timestamp.
    pub timestamp: DateTime<Utc>,
}

impl QuotePayload {
    /// Assemble a payload from validated customer details and the current
    /// state.
    ///
    /// # Errors
    ///
    /// Returns a [`QuoteError`] if the customer details fail validation;
    /// nothing is assembled in that case.
    pub fn assemble(
        customer: CustomerDetails,
        product: Option<BasketLine>,
        basket: &Basket,
        ledger: &PositionLedger,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, QuoteError> {
        customer.validate_for_submission()?;

        Ok(Self {
            customer,
            product,
            customizations: ledger.customized().cloned().collect(),
            basket: basket.clone(),
            timestamp: submitted_at,
        })
    }

    /// Serialize for the submission endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
