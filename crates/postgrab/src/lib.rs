// Copyright 2026 Postgrab Contributors
// SPDX-License-Identifier: Apache-2.0

//! Postgrab library: harvest the posts of a paginated feed into a manifest,
//! then download each post's content images into its own folder.
//!
//! The binary is a thin shell over [`cli`]; everything else is exposed for
//! integration testing against scripted pages.

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod harvest;
pub mod logging;
pub mod manifest;
pub mod naming;
pub mod pipeline;
pub mod progress;
pub mod renderer;
pub mod session;
