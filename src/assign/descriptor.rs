//! Assignment descriptor
//!
//! Controls how the mask is read and whether `C` is cleared outside it.

/// Modifiers of one assignment
///
/// - Complement mask: assign where the mask is false
/// - Structural mask: only the mask's pattern matters, not its values
/// - Replace: entries of `C(I,J)` outside the effective mask are deleted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Descriptor {
    pub mask_complement: bool,
    pub mask_structural: bool,
    pub replace: bool,
}

impl Descriptor {
    /// Create default descriptor
    pub fn new() -> Self {
        Self::default()
    }

    /// Set mask to complement
    pub fn complement_mask(mut self) -> Self {
        self.mask_complement = true;
        self
    }

    /// Set mask to structural
    pub fn structural_mask(mut self) -> Self {
        self.mask_structural = true;
        self
    }

    /// Set output to replace mode
    pub fn replace_output(mut self) -> Self {
        self.replace = true;
        self
    }

    /// Check if mask should be complemented
    pub fn is_mask_complemented(&self) -> bool {
        self.mask_complement
    }

    /// Check if mask is structural
    pub fn is_mask_structural(&self) -> bool {
        self.mask_structural
    }

    /// Check if output should be replaced
    pub fn should_replace_output(&self) -> bool {
        self.replace
    }
}
