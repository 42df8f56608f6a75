pub mod extent2d;
pub mod plane3d;

pub use extent2d::Extent2D;
pub use plane3d::Plane3D;
