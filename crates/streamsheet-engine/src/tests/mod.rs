mod common;
mod jump_semantics;
mod registry;
#[cfg(feature = "serde")]
mod serde_repr;
