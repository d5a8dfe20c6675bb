pub mod artifact;
pub mod github;
pub mod table;
