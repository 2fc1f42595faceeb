pub mod bot;
pub mod cache;
pub mod clock;
pub mod codec;
pub mod config;
pub mod leaderboard;
pub mod services;
pub mod storage;
pub mod ui;
