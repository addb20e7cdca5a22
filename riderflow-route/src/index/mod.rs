mod distance_index;
mod nearest_point;

pub use distance_index::DistanceIndex;
pub use nearest_point::NearestPoint;
