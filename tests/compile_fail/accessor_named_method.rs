//! Every handle type already has a `handle` accessor.

#[sash::api]
pub trait Widget {
    fn handle(&self) -> i32;
}

fn main() {}
