pub mod option_chain;
pub mod spot;

/// Where a collaborator-supplied value came from.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum DataQuality {
    Live,
    Fallback { reason: String },
}

/// A value plus its provenance. Fetchers never fail outward: on error they
/// hand back the documented fallback tagged with the reason.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Sourced<T> {
    pub value: T,
    pub quality: DataQuality,
}

impl<T> Sourced<T> {
    #[inline]
    pub fn live(value: T) -> Self {
        Self { value, quality: DataQuality::Live }
    }

    #[inline]
    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            quality: DataQuality::Fallback { reason: reason.into() },
        }
    }

    /// Caller-supplied values count as live data.
    #[inline]
    pub fn provided(value: T) -> Self {
        Self::live(value)
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        matches!(self.quality, DataQuality::Fallback { .. })
    }
}
