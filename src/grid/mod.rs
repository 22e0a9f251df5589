pub(crate) mod mask;
pub(crate) mod resample;
pub(crate) mod transform;
pub(crate) mod uniform;
