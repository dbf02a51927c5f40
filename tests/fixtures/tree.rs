// template type Tree(T)

use super::util::Ordering;

type T = i64;

pub struct Tree {
    root: Option<Box<Node>>,
}

pub struct Node {
    value: T,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Tree {
    pub fn new() -> crate::templates::tree::Tree {
        Tree { root: None }
    }

    pub fn contains(&self, value: &T) -> bool {
        let mut at = &self.root;
        while let Some(node) = at {
            at = match super::util::compare(value, &node.value) {
                Ordering::Less => &node.left,
                Ordering::Greater => &node.right,
                Ordering::Equal => return true,
            };
        }
        false
    }
}
