pub(crate) mod rhai_bridge;
pub(crate) mod rng;
