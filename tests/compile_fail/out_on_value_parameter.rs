//! `#[sash(out)]` needs a `&mut` parameter to write through.

#[sash::api]
pub trait Widget {
    fn get_count(&self, #[sash(out)] count: i32);
}

fn main() {}
