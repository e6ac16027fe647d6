//! `bool` is normalized on return, so it cannot be returned by reference.

#[sash::api]
pub trait Widget {
    fn visible_flag(&self) -> &mut bool;
}

fn main() {}
