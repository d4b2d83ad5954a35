pub mod sequential;
pub mod spec;

pub use sequential::Sequential;
pub use spec::{LayerSpec, ModelSpec};
