//! Shared test utilities for the nasa-tiles workspace.
//!
//! Provides layer fixtures, temporary cache directories and a few assertion
//! macros.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod dirs;
pub mod fixtures;

pub use dirs::*;
pub use fixtures::*;

/// Assert that a `Result` is an `Err` matching the given pattern.
///
/// ```ignore
/// use test_utils::assert_err_matches;
///
/// assert_err_matches!(build(), TileError::MalformedLayerKey(_));
/// ```
#[macro_export]
macro_rules! assert_err_matches {
    ($result:expr, $pattern:pat) => {{
        match $result {
            Err($pattern) => {}
            Err(other) => panic!(
                "expected error matching `{}`, got error: {:?}",
                stringify!($pattern),
                other
            ),
            Ok(_) => panic!("expected error matching `{}`, got Ok", stringify!($pattern)),
        }
    }};
}

#[cfg(test)]
mod tests {
    #[derive(Debug)]
    enum Failure {
        Boom,
        Other(u8),
    }

    #[test]
    fn test_assert_err_matches_passes() {
        let result: Result<(), Failure> = Err(Failure::Boom);
        assert_err_matches!(result, Failure::Boom);
    }

    #[test]
    #[should_panic(expected = "got Ok")]
    fn test_assert_err_matches_fails_on_ok() {
        let result: Result<(), Failure> = Ok(());
        assert_err_matches!(result, Failure::Boom);
    }

    #[test]
    #[should_panic(expected = "got error")]
    fn test_assert_err_matches_fails_on_other_error() {
        let result: Result<(), Failure> = Err(Failure::Other(1));
        assert_err_matches!(result, Failure::Boom);
    }
}
