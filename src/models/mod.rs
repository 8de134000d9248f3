// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod customer;
pub mod payment;

pub use customer::{Customer, PaymentMethodRef};
pub use payment::{PaymentRecord, PaymentStatus};
