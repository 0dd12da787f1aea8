pub mod clone;
pub mod extract;
pub mod in_memory;
pub mod normalize;
pub mod pushdown;
pub mod rescope;
pub mod verifier;
