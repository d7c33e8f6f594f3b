/// Move the menu cursor to the next item, wrapping back to the first.
pub fn select_next(selected: usize, item_count: usize) -> usize {
    if item_count == 0 {
        0
    } else {
        (selected + 1) % item_count
    }
}

/// The entry after `current` in `options`, wrapping. Falls back to the
/// first option when `current` is not listed.
pub fn cycle_option<T: Copy + PartialEq>(options: &[T], current: T) -> Option<T> {
    let first = *options.first()?;
    match options.iter().position(|o| *o == current) {
        Some(i) => Some(options[select_next(i, options.len())]),
        None => Some(first),
    }
}
