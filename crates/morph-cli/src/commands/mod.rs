pub mod serve;
pub mod sweep_orphans;

pub use serve::ServeCommand;
pub use sweep_orphans::SweepOrphansCommand;
