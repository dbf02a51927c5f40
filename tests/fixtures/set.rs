// template type Set(A)
#![allow(non_snake_case)]

use std::collections::HashMap;

// Element type, replaced on instantiation.
type A = u8;

/// An unordered collection of distinct `A`s.
pub struct Set {
    items: HashMap<A, ()>,
}

pub fn NewSet() -> Box<Set> {
    Box::new(Set {
        items: HashMap::new(),
    })
}

impl Set {
    pub fn add(&mut self, item: A) -> &mut Set {
        self.items.insert(item, ());
        self
    }

    pub fn contains(&self, item: &A) -> bool {
        self.items.contains_key(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[allow(non_snake_case)]
    pub fn SetUp(&mut self) {
        self.items.clear();
    }
}
