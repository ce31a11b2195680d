//! Checkout Wizard
//!
//! Three steps: delivery (address + method), payment, confirmation.
//! Validation is a pure function of the step and the selections so it can be
//! exercised without any transport.

use super::models::{CheckoutSelections, DeliveryAddress, Step};
use crate::{orders::models::PaymentMethod, pricing::DeliveryMethod};
use serde::Serialize;
use std::{collections::BTreeMap, fmt};
use thiserror::Error;

pub const FIELD_ADDRESS: &str = "address";
pub const FIELD_DELIVERY_METHOD: &str = "delivery_method";
pub const FIELD_PAYMENT_METHOD: &str = "payment_method";

/// Field-level validation failures, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, &'static str>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.fields.get(field).copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }

    /// Union of both sets of failures
    pub fn merge(mut self, other: Self) -> Self {
        self.fields.extend(other.fields);
        self
    }

    fn add(&mut self, field: &'static str, message: &'static str) {
        self.fields.insert(field, message);
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<_> = self.fields.keys().copied().collect();
        write!(f, "missing required fields: {}", fields.join(", "))
    }
}

/// Checks the selections a step requires before moving past it.
pub fn validate_step(step: Step, selections: &CheckoutSelections) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    match step {
        Step::Delivery => {
            if selections.address.is_none() {
                errors.add(FIELD_ADDRESS, "Veuillez sélectionner une adresse de livraison");
            }
            if selections.delivery_method.is_none() {
                errors.add(FIELD_DELIVERY_METHOD, "Veuillez choisir un mode de livraison");
            }
        }
        Step::Payment => {
            if selections.payment_method.is_none() {
                errors.add(FIELD_PAYMENT_METHOD, "Veuillez choisir un mode de paiement");
            }
        }
        Step::Confirmation => {}
    }

    errors.into_result()
}

/// Step index plus the selections made so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutWizard {
    step: Step,
    selections: CheckoutSelections,
}

impl CheckoutWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn selections(&self) -> &CheckoutSelections {
        &self.selections
    }

    pub fn delivery_method(&self) -> Option<DeliveryMethod> {
        self.selections.delivery_method
    }

    pub fn select_delivery(
        &mut self,
        address: Option<DeliveryAddress>,
        method: Option<DeliveryMethod>,
    ) {
        self.selections.address = address;
        self.selections.delivery_method = method;
    }

    pub fn select_payment(&mut self, method: Option<PaymentMethod>) {
        self.selections.payment_method = method;
    }

    /// Validates the current step and moves forward one step.
    pub fn next(&mut self) -> Result<Step, ValidationErrors> {
        validate_step(self.step, &self.selections)?;
        self.step = self.step.next();
        Ok(self.step)
    }

    /// Moves back one step; selections are kept.
    pub fn back(&mut self) -> Step {
        self.step = self.step.previous();
        self.step
    }

    /// Back to step 1 with nothing selected
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
