// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Schema Generation Module
//!
//! This module provides functions to generate the JSON Schema of the process
//! model, so definition authors and external parsers can validate documents
//! before handing them to the compiler.

pub mod model_schema;

pub use model_schema::{NODE_TYPES, generate_model_schema};
