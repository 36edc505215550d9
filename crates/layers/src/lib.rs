pub mod collection;
pub mod layer;
pub mod overlay;

pub use collection::*;
pub use layer::*;
pub use overlay::*;
