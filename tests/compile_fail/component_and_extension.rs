//! A declaration is a component or an extension, never both.

#[sash::api(component = 1, extension = 2)]
pub trait IActor {
    fn get_skin(&self) -> i32;
}

fn main() {}
