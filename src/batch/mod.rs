pub(crate) mod image;
pub(crate) mod layout;
pub(crate) mod paste;
