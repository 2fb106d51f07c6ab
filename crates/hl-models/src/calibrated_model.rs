//! The `CalibratedModel` trait.

use hl_core::{errors::Result, Real};

/// A model whose free parameters can be read and replaced as a flat vector,
/// which is the form optimizers work in.
pub trait CalibratedModel {
    /// Current parameter values.
    fn params(&self) -> Vec<Real>;

    /// Replace all parameters. The model is left unchanged if `values` is
    /// rejected.
    fn set_params(&mut self, values: &[Real]) -> Result<()>;
}
