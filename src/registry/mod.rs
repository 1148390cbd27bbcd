//! Tool and resource registries (spec components I and J).

pub mod resource;
pub mod tool;
