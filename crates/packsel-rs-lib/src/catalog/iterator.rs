use super::Pack;

pub struct InInstallGroup<'a, 'g, I>
where
	I: Iterator<Item = &'a Pack>,
{
	group: &'g str,
	underlying: I,
}

impl<'a, 'g, I> Iterator for InInstallGroup<'a, 'g, I>
where
	I: Iterator<Item = &'a Pack>,
{
	type Item = I::Item;

	fn next(&mut self) -> Option<Self::Item> {
		self.underlying.by_ref().find(|pack| pack.is_in_install_group(self.group))
	}
}

pub trait InInstallGroupExt<'a>: Iterator<Item = &'a Pack>
{
	/// Filters the iterator to packs tagged with `group` or not tagged at all.
	fn in_install_group(self, group: &str) -> InInstallGroup<'a, '_, Self>
	where
		Self: Sized,
	{
		InInstallGroup { underlying: self, group }
	}
}

impl<'a, I: Iterator<Item = &'a Pack>> InInstallGroupExt<'a> for I {}


pub struct Visible<'a, I>
where
	I: Iterator<Item = &'a Pack>,
{
	underlying: I,
}

impl<'a, I> Iterator for Visible<'a, I>
where
	I: Iterator<Item = &'a Pack>,
{
	type Item = I::Item;

	fn next(&mut self) -> Option<Self::Item> {
		self.underlying.by_ref().find(|pack| !pack.hidden)
	}
}

pub trait VisibleExt<'a>: Iterator<Item = &'a Pack>
{
	/// Filters out hidden packs.
	fn visible(self) -> Visible<'a, Self>
	where
		Self: Sized,
	{
		Visible { underlying: self }
	}
}

impl<'a, I: Iterator<Item = &'a Pack>> VisibleExt<'a> for I {}
