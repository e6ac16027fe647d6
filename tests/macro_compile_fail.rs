//! Compile-fail tests for macro error paths.
//!
//! Each file under `tests/compile_fail/` misuses `#[sash::api]` in one way
//! and must be rejected at expansion time.

#[test]
fn macro_compile_fail_tests() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/compile_fail/*.rs");
}
