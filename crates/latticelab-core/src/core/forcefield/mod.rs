pub mod estimation;
pub mod potentials;
