pub mod attendance;
pub mod core;
pub mod dashboard;
pub mod notices;
pub mod onboarding;
pub mod payments;
pub mod timetable;
pub mod wizards;
