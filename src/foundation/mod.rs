pub(crate) mod core;
pub(crate) mod element;
pub(crate) mod error;
