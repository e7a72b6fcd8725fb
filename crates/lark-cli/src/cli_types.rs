use clap::ValueEnum;

use lark_modes::ModeName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliModeName {
    Tag,
    Agent,
    Review,
}

impl From<CliModeName> for ModeName {
    fn from(value: CliModeName) -> Self {
        match value {
            CliModeName::Tag => ModeName::Tag,
            CliModeName::Agent => ModeName::Agent,
            CliModeName::Review => ModeName::Review,
        }
    }
}
