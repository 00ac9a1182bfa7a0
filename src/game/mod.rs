pub mod audio;
pub mod jump;
pub mod level;
pub mod progress;
pub mod progression;
pub mod run;
pub mod session;
pub mod store;
