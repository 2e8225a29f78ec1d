pub mod audio;
pub mod compute;
pub mod config;
pub mod entities;
pub mod formation;
pub mod game;
pub mod store;
pub mod tween;
