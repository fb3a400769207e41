// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod abac;
mod logging;

pub use abac::{AbacConfig, AbacConfigLayer, ClassLevelChecks};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
