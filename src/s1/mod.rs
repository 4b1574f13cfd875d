pub mod angle;
pub mod interval;

pub use angle::{Angle, Deg};
pub use interval::Interval;
