//! Platform abstraction layer for the stopwatch clock.
//!
//! This module provides a platform abstraction that allows switching between
//! the real monotonic clock and a fake implementation that tests can move
//! forward explicitly.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::Platform;
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::FakePlatform;
pub(crate) use real::RealPlatform;
