mod bound_box;
mod cancel;
mod ray;
mod value_range;
mod windowing;

pub use bound_box::OrientedBox;
pub use cancel::CancelToken;
pub use ray::Ray;
pub use value_range::ValueRange;
pub use windowing::WindowingParameters;
