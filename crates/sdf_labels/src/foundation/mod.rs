//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types for anchor points and colors
//! - Collections and handle types
//! - Logging utilities

pub mod collections;
pub mod logging;
pub mod math;
