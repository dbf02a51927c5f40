// template type Set(A)
// template type Bag(A)

type A = u8;

pub struct Set {
    items: Vec<A>,
}
