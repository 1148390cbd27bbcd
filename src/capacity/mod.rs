//! Pod-capacity estimation, usage trend projection, and scaling-impact
//! analysis (spec components G).

pub mod calculator;
pub mod scaling;
pub mod trending;
