use crate::error::BoardError;

/// Round-robin cursor over the boards shown on a multi-station display.
///
/// Knows nothing about polling; it is advanced once per render cycle.
#[derive(Debug, Clone)]
pub struct BoardRotator<T> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> BoardRotator<T> {
    pub fn new(items: Vec<T>) -> Result<Self, BoardError> {
        if items.is_empty() {
            return Err(BoardError::Config(
                "at least one station is required".to_string(),
            ));
        }
        Ok(Self { items, cursor: 0 })
    }

    /// Return the item whose turn it is and move the cursor on.
    pub fn advance(&mut self) -> &T {
        let index = self.cursor;
        self.cursor = (index + 1) % self.items.len();
        &self.items[index]
    }

    /// The item the next `advance` will return.
    pub fn current(&self) -> &T {
        &self.items[self.cursor]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}
