//! framesink presentation layer
//!
//! The host supplies an [`OutputSurface`] and (optionally) a
//! [`RefreshDriver`] bound to its native frame clock; the [`Presenter`]
//! drains the latest-wins slot once per refresh and blits to the surface.
//! [`TimerDriver`] is the fixed-period fallback for hosts without an
//! exposed frame clock, and [`HeadlessSurface`] is a software surface used
//! by the demo binary and tests.

pub mod headless;
pub mod presenter;
pub mod refresh;
pub mod surface;

pub use headless::HeadlessSurface;
pub use presenter::Presenter;
pub use refresh::{RefreshDriver, TimerDriver};
pub use surface::{DrawTarget, FitTransform, OutputSurface, ScratchImage};
