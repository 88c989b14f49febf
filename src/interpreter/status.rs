use crate::utils::RcCell;

/// Bookkeeping for one active `#for` level, reachable in templates through
/// the `for` variable and chained to the enclosing loop's status.
#[derive(Debug)]
pub struct ForStatus {
	pub parent: Option<RcCell<ForStatus>>,
	/// Element count, when the collection knows its size up front.
	pub size:   Option<usize>,
	/// Nesting depth, zero for an outermost loop.
	pub level:  usize,
	/// Zero-based iteration index, incremented once per iteration.
	pub index:  usize,
}

impl ForStatus {
	pub fn new(parent: Option<RcCell<ForStatus>>, size: Option<usize>, level: usize) -> Self {
		Self { parent, size, level, index: 0 }
	}

	/// One-based iteration count.
	pub fn count(&self) -> usize { self.index + 1 }

	pub fn first(&self) -> bool { self.index == 0 }

	pub fn last(&self) -> bool { self.size.map(|size| self.index + 1 == size).unwrap_or(false) }

	pub fn odd(&self) -> bool { self.count() % 2 == 1 }

	pub fn even(&self) -> bool { self.count() % 2 == 0 }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_last_odd_even() {
		let mut status = ForStatus::new(None, Some(3), 0);
		assert!(status.first());
		assert!(!status.last());
		assert!(status.odd());
		status.index = 1;
		assert!(!status.first());
		assert!(status.even());
		status.index = 2;
		assert!(status.last());
		assert!(status.odd());
	}

	#[test]
	fn unknown_size_is_never_last() {
		let status = ForStatus::new(None, None, 0);
		assert!(!status.last());
	}

	#[test]
	fn chains_to_parent() {
		let outer = RcCell::new(ForStatus::new(None, Some(2), 0));
		let inner = ForStatus::new(Some(outer.clone()), Some(3), 1);
		assert_eq!(inner.level, 1);
		assert_eq!(inner.parent.as_ref().unwrap().borrow().level, 0);
	}
}
