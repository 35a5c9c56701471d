pub mod cli_steps;
pub mod post_steps;
