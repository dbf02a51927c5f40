// template type Set(A)

type A = u8;

pub struct Set {
    items: Vec<A>,
}

mod inner {
    pub fn helper() {}
}
