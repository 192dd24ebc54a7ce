pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Init, Inspect, Load, Locator, Save, Version};
