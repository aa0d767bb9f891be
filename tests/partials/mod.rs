mod config;
mod evaluation;
mod multi_link;
