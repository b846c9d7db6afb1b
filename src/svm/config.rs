//! Per-instance configuration. Nothing here is read from the environment; embedders build an
//! [`SvmConfig`] and hand it to the manager at construction.

/// What happens when an internal invariant of the manager is violated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Log the violation and fail only the current compilation or load attempt.
    #[default]
    Lenient,
    /// Panic. Meant for development builds and test suites.
    Strict,
}

/// Deepest array nesting the class-file format can express.
pub const MAX_ARRAY_DIMENSIONS: u32 = 255;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SvmConfig {
    pub strictness: Strictness,
    pub max_array_dimensions: u32,
}

impl SvmConfig {
    pub fn strict() -> Self {
        Self::default().with_strictness(Strictness::Strict)
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn with_max_array_dimensions(mut self, dims: u32) -> Self {
        self.max_array_dimensions = dims;
        self
    }

    pub fn assertions_are_fatal(&self) -> bool {
        self.strictness == Strictness::Strict
    }
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            strictness: Strictness::default(),
            max_array_dimensions: MAX_ARRAY_DIMENSIONS,
        }
    }
}
