mod presets;
mod tester;

pub use presets::{
    Command, HEAVY_CONCURRENCY, HEAVY_RATE, NORMAL_CONCURRENCY, NORMAL_RATE, PresetHeavyArgs,
    PresetNormalArgs,
};
pub use tester::TesterArgs;
