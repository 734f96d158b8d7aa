//! Data the dashboard consumes: map features, the attribute table and
//! dataset metadata.

pub mod attributes;
pub mod feature;
pub mod status;
