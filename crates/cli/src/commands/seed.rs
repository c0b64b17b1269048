use storemail_core::fixtures;
use tracing::info;

use crate::commands::CommandResult;

/// Demo input document; pipe it into `storemail recommend --input`
pub fn run(seed: u64) -> CommandResult {
    let input = fixtures::demo_input(seed);

    info!(
        event_name = "cli.seed.generated",
        seed,
        stores = input.stores.len(),
        campaigns = input.campaigns.len(),
        "demo performance data generated"
    );

    CommandResult::payload("seed", &input)
}
