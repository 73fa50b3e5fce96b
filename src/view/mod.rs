// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! View module - camera framing

mod framer;

pub use framer::{
    frame_bounds, frame_view, ViewError, ViewFrame, ViewParams, DEFAULT_EYE_BACKOFF,
    DEFAULT_VIEWSIZE,
};
