//! Load tokens: a monotonic generation counter used to detect superseded loads.

/// Marker handed to one run of the load protocol.
///
/// A token is valid while it is the most recently issued one and the issuer
/// has not been invalidated since.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct LoadToken(u64);

impl LoadToken {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Issues load tokens. Issuing a new token invalidates the previous one.
#[derive(Default, Debug)]
pub struct TokenIssuer {
    generation: u64,
    live: bool,
}

impl TokenIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn issue(&mut self) -> LoadToken {
        self.generation = self.generation.wrapping_add(1);
        self.live = true;
        LoadToken(self.generation)
    }

    /// Invalidate whatever token is outstanding without issuing a new one.
    #[inline]
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.live = false;
    }

    #[inline]
    pub fn is_current(&self, token: LoadToken) -> bool {
        self.live && token.0 == self.generation
    }

    /// Mark `token` as finished. No effect if it is no longer current.
    #[inline]
    pub fn settle(&mut self, token: LoadToken) {
        if self.is_current(token) {
            self.live = false;
        }
    }

    /// True while an issued token has neither been superseded nor invalidated.
    pub fn has_outstanding(&self) -> bool {
        self.live
    }
}
