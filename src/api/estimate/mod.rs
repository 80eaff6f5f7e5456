// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Photo estimation endpoint module
//!
//! Provides POST /v1/estimate for food type, weight and nutrients from a photo.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::estimate_handler;
pub use request::EstimateRequest;
pub use response::EstimateResponse;
