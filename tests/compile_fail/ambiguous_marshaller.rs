//! A marshaller bound to `bool` clashes with the built-in one.

pub struct MyBool;

#[sash::api(marshal(bool = MyBool))]
pub trait Widget {
    fn is_visible(&self) -> bool;
}

fn main() {}
