mod lloyd;

pub use lloyd::Lloyd;
