//! Native API methods are declarations only.

#[sash::api]
pub trait Widget {
    fn get_count(&self) -> i32 {
        0
    }
}

fn main() {}
