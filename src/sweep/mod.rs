pub(crate) mod generation;
pub(crate) mod plan;
pub(crate) mod settle;
