//! Actor runtime and the research session for Sift.
//!
//! [`research::ResearchActor`] owns the session state and runs the
//! search → prompt → stream pipeline; everything it has to say goes to a
//! [`surface::Surface`].
pub mod actor;
pub mod builder;
pub mod research;
pub mod surface;
pub mod system;

pub use research::{Pipeline, ResearchActor, ResearchMsg};
pub use surface::{Output, SessionSnapshot, Surface};
