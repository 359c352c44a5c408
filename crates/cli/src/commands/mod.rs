pub(crate) mod check;
pub(crate) mod complete;
pub(crate) mod format;
pub(crate) mod symbols;
pub(crate) mod tree;
