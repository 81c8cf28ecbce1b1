pub mod duration;
pub mod error;
pub mod geometry;
pub mod kinds;

pub use duration::{DurationError, Timeout, duration_from_secs, parse_duration};
pub use error::SurfaceError;
pub use geometry::{DisplayRectangle, Point};
pub use kinds::{ActionKind, InputSource, Pointer, ReadyState, UnknownVariant, WindowTarget};
