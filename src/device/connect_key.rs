//! Connect key resolution.

/// Where a resolved connect key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Supplied by the caller.
    Explicit,
    /// `HDC_CONNECT_KEY`.
    ComponentDefault,
    /// `DEFAULT_CONNECT_KEY`.
    GenericDefault,
}

/// Outcome of walking the connect key fallback chain.
///
/// `Unresolved` is terminal: callers either proceed without a target or
/// fail fast, they never retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectKeyResolution {
    Resolved { key: String, source: KeySource },
    Unresolved,
}

impl ConnectKeyResolution {
    /// Explicit argument, then component default, then generic default.
    /// Empty strings are skipped at every step.
    pub fn resolve(
        explicit: Option<&str>,
        component_default: Option<&str>,
        generic_default: Option<&str>,
    ) -> Self {
        [
            (explicit, KeySource::Explicit),
            (component_default, KeySource::ComponentDefault),
            (generic_default, KeySource::GenericDefault),
        ]
        .into_iter()
        .find_map(|(key, source)| {
            key.filter(|k| !k.is_empty()).map(|k| Self::Resolved {
                key: k.to_string(),
                source,
            })
        })
        .unwrap_or(Self::Unresolved)
    }

    /// Only the explicit argument counts.
    pub fn explicit_only(explicit: Option<&str>) -> Self {
        Self::resolve(explicit, None, None)
    }

    /// The resolved key, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Resolved { key, .. } => Some(key),
            Self::Unresolved => None,
        }
    }

    /// Which step of the chain supplied the key.
    pub fn source(&self) -> Option<KeySource> {
        match self {
            Self::Resolved { source, .. } => Some(*source),
            Self::Unresolved => None,
        }
    }
}
