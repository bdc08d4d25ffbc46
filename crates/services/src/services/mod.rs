pub mod directory;
pub mod onboarding;
pub mod session;
