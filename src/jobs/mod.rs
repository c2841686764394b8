pub mod cooldown_timer;
pub mod session_reaper;
