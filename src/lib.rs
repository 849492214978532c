mod codec;
mod config;
mod constants;
mod errors;
mod metrics;
mod proto;
mod session;
mod watch;
pub mod utils;

pub use codec::*;
pub use config::*;
pub use errors::*;
pub use metrics::*;
pub use proto::*;
pub use session::*;
pub use watch::*;

//-----------------------------------------------------------
// Autometrics
/// autometrics: https://docs.autometrics.dev/rust/adding-alerts-and-slos
use autometrics::objectives::Objective;
use autometrics::objectives::ObjectiveLatency;
use autometrics::objectives::ObjectivePercentile;
const API_SLO: Objective = Objective::new("watch_api")
    .success_rate(ObjectivePercentile::P99_9)
    .latency(ObjectiveLatency::Ms10, ObjectivePercentile::P99);
