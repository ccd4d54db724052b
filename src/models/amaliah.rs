// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Voluntary good deeds (amaliah) and their point values.

use serde::Serialize;

/// A kind of deed users can check off once per day.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AmaliahType {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub points: i64,
    pub icon: String,
    pub is_active: bool,
}
