// SPDX-License-Identifier: MIT

//! Request middleware.

pub mod auth;
pub mod hooks_auth;
pub mod security;
