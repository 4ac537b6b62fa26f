/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `summarize`: reduce a performance trace to its metrics summary
- `replay`: run a recorded event feed through a full recording session
- `show`: print the timeline of a finished session
*/

pub mod replay;
pub mod show;
pub mod summarize;

pub use replay::{read_feed, replay_feed, run_replay};
pub use show::{load_timeline, run_show};
pub use summarize::run_summarize;
