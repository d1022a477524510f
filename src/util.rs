//! Small indexing helpers shared by the ring-buffer based components.

/// Wraps a possibly negative ring index into `[0, len)`.
///
/// A plain `%` is not enough here: intermediate values like
/// `write_idx - lag` can be negative, and `%` keeps the sign of the
/// dividend.
#[inline]
pub(crate) fn wrap_index(index: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    let len = len as isize;
    (((index % len) + len) % len) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn wraps_positive_indices() {
        check!(wrap_index(0, 120) == 0);
        check!(wrap_index(119, 120) == 119);
        check!(wrap_index(120, 120) == 0);
        check!(wrap_index(245, 120) == 5);
    }

    #[test]
    fn wraps_negative_indices() {
        check!(wrap_index(-1, 120) == 119);
        check!(wrap_index(-120, 120) == 0);
        check!(wrap_index(-121, 120) == 119);
        // write_idx 3 minus lag 10 in a ring of 120
        check!(wrap_index(3 - 10, 120) == 113);
    }
}
