pub mod opportunity;
pub mod pattern;
pub mod posting;
pub mod profile;
pub mod skill;
pub mod source;
