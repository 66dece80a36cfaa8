//! Evolution drivers: run options, search state, the generation engine,
//! and the panmictic and island top-level loops.

pub mod driver;
pub(crate) mod engine;
pub mod islands;
pub mod options;
pub mod state;

pub use driver::{Ga, GaBuilder, GaResult};
pub use engine::{MonitorFn, MutationRateFn, PostFitnessFn};
pub use islands::{IslandGa, IslandGaResult, IslandReport};
pub use options::{default_elitism, GaOptions, IslandOptions};
pub use state::{GenerationSummary, SearchState};
