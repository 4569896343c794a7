mod animatable;
mod spring;
mod timeline;
mod timing;

pub use animatable::Animatable;
pub use spring::{SpringConfig, SpringState};
pub use timeline::{Outcome, Timeline, TimelineStatus};
pub use timing::TimingFunction;
