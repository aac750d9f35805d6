//! Environment source: `SHORTSMITH__RUN__MAX_IMAGES=5` sets `run.max_images`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const PREFIX: &str = "SHORTSMITH";
pub const SEPARATOR: &str = "__";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(PREFIX)
            .separator(SEPARATOR)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("images.endpoints")
            .with_list_parse_key("delivery.recipients"),
    )
}
