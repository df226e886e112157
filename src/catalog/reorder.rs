use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move item {from} to {to} in a list of {len}")]
pub struct OutOfRange {
    pub from: usize,
    pub to: usize,
    pub len: usize,
}

/// Moves the element at `from` to `to`, shifting the ones in between.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), OutOfRange> {
    let len = items.len();
    if from >= len || to >= len {
        return Err(OutOfRange { from, to, len });
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}
