/// template type Set(A)
pub struct Set {
    items: Vec<u8>,
}
