//! Generic declarations cannot cross the native boundary.

#[sash::api]
pub trait Container<T> {
    fn size(&self) -> i32;
}

fn main() {}
