/// Generators for random short ids and globally unique ids
pub mod identity;
