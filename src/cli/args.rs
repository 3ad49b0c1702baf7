use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "career_mentor")]
#[command(
    about = "Career quiz followed by a chat with an AI career mentor",
    long_about = "Career quiz followed by a chat with an AI career mentor\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default probe path when --config is not provided:\n    1. $XDG_CONFIG_HOME/career-mentor/config.toml\n    2. ~/.config/career-mentor/config.toml\n\nEnvironment:\n  GEMINI_API_KEY (or GOOGLE_API_KEY)  enables the mentor chat\n  YOUTUBE_API_KEY                     enables video suggestions"
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print outgoing HTTP requests and responses (secrets redacted) to stderr.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::CliArgs;
    use clap::Parser;

    #[test]
    fn parse_defaults() {
        let args = CliArgs::try_parse_from(["career_mentor"]).expect("should parse");
        assert_eq!(args.config, None);
        assert!(!args.verbose);
    }

    #[test]
    fn parse_config_and_verbose_flags() {
        let args = CliArgs::try_parse_from([
            "career_mentor",
            "--config",
            "/tmp/custom.toml",
            "--verbose",
        ])
        .expect("parse");
        assert_eq!(
            args.config.as_deref(),
            Some(std::path::Path::new("/tmp/custom.toml"))
        );
        assert!(args.verbose);

        let short = CliArgs::try_parse_from(["career_mentor", "-v"]).expect("parse -v");
        assert!(short.verbose);
    }
}
