//! Classification of joins into joins that can stream their left side into the right side and
//! joins whose sides must be evaluated independently.

mod linear;

pub use linear::{is_linear, is_linear_left_join};
