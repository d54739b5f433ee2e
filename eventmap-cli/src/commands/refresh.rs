use anyhow::Result;
use owo_colors::OwoColorize;

use crate::context::Context;

/// Drop the persisted event snapshot. Saved events are kept.
pub fn run(ctx: &Context) -> Result<()> {
    ctx.cache()?.invalidate();
    println!(
        "{} Cleared cached events in {}",
        "✓".green(),
        ctx.config.cache_path().display().dimmed()
    );
    Ok(())
}
