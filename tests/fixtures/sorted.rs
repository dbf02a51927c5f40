/* template type SortedList(T, Less) */

// Placeholders: the element type and its ordering.
type T = i32;

fn Less(a: &T, b: &T) -> bool {
    a < b
}

pub struct SortedList {
    items: Vec<T>,
}

pub const SORTED_LIST_INITIAL: usize = 8;

impl SortedList {
    pub fn new() -> SortedList {
        SortedList {
            items: Vec::with_capacity(SORTED_LIST_INITIAL),
        }
    }

    pub fn insert(&mut self, item: T) {
        let at = self
            .items
            .iter()
            .position(|existing| Less(&item, existing))
            .unwrap_or(self.items.len());
        self.items.insert(at, item);
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }
}
