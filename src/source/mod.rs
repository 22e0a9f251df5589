pub(crate) mod dataset;
pub(crate) mod memory;
pub(crate) mod snapshot;
