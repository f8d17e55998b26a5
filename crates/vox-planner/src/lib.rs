//! Plan generation: utterance in, validated plan of desktop steps out.
//!
//! The routing policy and the utterance go to a completion provider at
//! temperature 0. The response is recovered from fences and surrounding
//! prose, parsed as JSON or as a permissive literal, and validated into a
//! [`Plan`]. [`PlanGenerator::route_intent`] never fails: any problem is
//! logged and becomes "no plan".

pub mod error;
pub mod generator;
pub mod literal;
pub mod plan;
pub mod policy;
pub mod provider_registration;
pub mod recovery;
pub mod retry;

pub use error::PlanError;
pub use generator::PlanGenerator;
pub use plan::{Plan, Step};
pub use policy::{PolicySource, RoutingPolicy};
pub use provider_registration::register_providers;
