pub mod models;
pub mod perturb;
pub mod projection;
pub mod search;
