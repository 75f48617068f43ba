pub mod system;

pub use aurora_backend as backend;
pub use aurora_math as math;
pub use aurora_scene as scene;
pub use aurora_utils as utils;

pub mod prelude {
    pub use crate::system::*;
    pub use aurora_backend::*;
    pub use aurora_math::*;
    pub use aurora_scene::*;
    pub use aurora_utils::collections::*;
}
