mod inspect;
mod maintain;
mod stats;
mod top;
mod track;

pub use inspect::cmd_inspect;
pub use maintain::cmd_maintain;
pub use stats::cmd_stats;
pub use top::cmd_top;
pub use track::cmd_track;
