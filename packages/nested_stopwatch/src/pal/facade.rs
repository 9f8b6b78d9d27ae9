use std::fmt::{self, Debug};
#[cfg(test)]
use std::sync::Arc;
use std::time::Instant;

#[cfg(test)]
use crate::pal::FakePlatform;
use crate::pal::real::REAL_PLATFORM;
use crate::pal::{Platform, RealPlatform};

/// Dispatches clock reads to either the real clock or, in tests, a fake one.
#[derive(Clone)]
pub(crate) enum PlatformFacade {
    Real(&'static RealPlatform),

    #[cfg(test)]
    Fake(Arc<FakePlatform>),
}

impl PlatformFacade {
    pub(crate) fn real() -> Self {
        Self::Real(&REAL_PLATFORM)
    }

    #[cfg(test)]
    pub(crate) fn fake(platform: FakePlatform) -> Self {
        Self::Fake(Arc::new(platform))
    }
}

impl Platform for PlatformFacade {
    fn now(&self) -> Instant {
        match self {
            Self::Real(p) => p.now(),
            #[cfg(test)]
            Self::Fake(p) => p.now(),
        }
    }
}

impl Debug for PlatformFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(p) => p.fmt(f),
            #[cfg(test)]
            Self::Fake(p) => p.fmt(f),
        }
    }
}
