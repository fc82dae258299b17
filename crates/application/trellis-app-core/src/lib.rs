pub mod app_core;
pub mod domain;
pub mod kernel;
pub mod modules;
pub mod navigator;

pub use app_core::*;
pub use domain::{
    CurrentUser, Fields, Notification, RootState, Run, UserSummary, Workflow,
};
pub use kernel::{AppKernel, CommandOutcome};
pub use modules::*;
pub use navigator::{NavigationOutcome, Navigator};
