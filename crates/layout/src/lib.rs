//! Instance layout: where each instance starts and how it is initially turned.
//!
//! # Invariants
//! - Output holds exactly `side_count³` blocks, in grid order (x outer, z inner).
//! - Instance 0 sits at grid coordinate (1, 1, 1).
//! - The same seed and inputs give a byte-identical buffer.

mod generator;

pub use generator::{generate, generate_field, random_rotation};

pub fn crate_info() -> &'static str {
    "cubefield-layout v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("layout"));
    }
}
