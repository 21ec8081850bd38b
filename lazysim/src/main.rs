//! # lazysim
//!
//! Entry point for the `lazysim` binary. See [`lazysim::app::run`].

use anyhow::Result;
use clap::Parser;
use lazysim::app::{self, Args};

fn main() -> Result<()> {
    app::run(&Args::parse())
}
