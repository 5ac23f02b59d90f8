pub mod keyboard;
pub mod serial;
