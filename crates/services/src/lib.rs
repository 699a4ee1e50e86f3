#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod group_service;
pub mod participant_service;
pub mod tracker_service;

pub use tracker_core::Clock;

pub use app_services::AppServices;
pub use error::{
    AppServicesError, GroupServiceError, ParticipantServiceError, TrackerServiceError,
};
pub use group_service::{GroupOverview, GroupService};
pub use participant_service::ParticipantService;
pub use tracker_service::{Leaderboard, ToggleOutcome, TrackerService};
