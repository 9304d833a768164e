//! Multi-error reports

use core::{fmt, slice};
use std::{error::Error, vec};

/// A non-empty list of errors that are reported together
///
/// Chip description mistakes are fixed in one pass, so checks never stop at the first error.
#[derive(Clone, Debug, PartialEq)]
pub struct Report<E> {
    errors: Vec<E>,
}

impl<E> Report<E> {
    /// Returns `Err` with all `errors` unless the list is empty
    pub fn check(errors: Vec<E>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Report { errors })
        }
    }

    /// The reported errors, in the order they were found
    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    /// Number of reported errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always `false`; a report holds at least one error
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterates over the reported errors
    pub fn iter(&self) -> slice::Iter<'_, E> {
        self.errors.iter()
    }
}

impl<E> IntoIterator for Report<E> {
    type Item = E;
    type IntoIter = vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'r, E> IntoIterator for &'r Report<E> {
    type Item = &'r E;
    type IntoIter = slice::Iter<'r, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl<E> fmt::Display for Report<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.errors.len();
        write!(f, "{} error{}", n, if n == 1 { "" } else { "s" })?;
        for error in &self.errors {
            write!(f, "\n- {}", error)?;
        }
        Ok(())
    }
}

impl<E> Error for Report<E> where E: fmt::Debug + fmt::Display {}
