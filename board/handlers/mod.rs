pub mod index;
pub mod runs;
pub mod scalars;
