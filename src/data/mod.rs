pub mod dataset;
pub mod idx;
pub mod mnist;
pub mod toy;

pub use dataset::Dataset;
pub use mnist::load_mnist;
