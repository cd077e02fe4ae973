pub(crate) mod bucket;
pub(crate) mod chain;
pub(crate) mod peer;
pub(crate) mod registry;
