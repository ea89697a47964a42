#![doc(hidden)]

pub(crate) mod dptree_ext;
