pub(crate) mod interpolated;
