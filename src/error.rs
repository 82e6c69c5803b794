// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for the composition core.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid note: {0}")]
    InvalidNote(String),

    #[error("Invalid chord name: {0}")]
    InvalidChordName(String),

    #[error("Unknown chord suffix: {0}")]
    UnknownChordSuffix(String),

    #[error("Mutation not found: {0}")]
    MutationNotFound(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("No serializer found for version {0}")]
    UnknownVersion(String),

    #[error("Invalid serializer version: {0}")]
    InvalidVersion(String),

    #[error("Random value {0} is out of the range [0, 1)")]
    SampleOutOfRange(f64),
}

pub type Result<T> = std::result::Result<T, Error>;
