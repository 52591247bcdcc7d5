// CLI module for convertifier

use crate::config::AppConfig;
use crate::converter::Converter;
use crate::models::{ConvertRequest, Language, Validation};
use crate::translation::{ensure_not_empty, validate};
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::AsyncReadExt;

/// convertifier - Python <-> C++ code converter backed by Gemini
#[derive(Parser, Debug)]
#[command(name = "convertifier", version, about, long_about = None)]
pub struct Args {
    /// Config file to use instead of ~/.convertifier/config.toml and ./convertifier.toml
    #[arg(long, short = 'c', global = true, env = "CONVERTIFIER_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the web UI and JSON API (default)
    Serve(ServeArgs),
    /// Convert a file (or stdin) to the other language
    Convert(ConvertArgs),
    /// Check that a file (or stdin) is valid input; exits 1 when it is not
    Validate(ValidateArgs),
    /// Print the effective configuration as TOML, API key redacted
    Config,
}

#[derive(ClapArgs, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind, overrides server.host
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on, overrides server.port
    #[arg(long, short)]
    pub port: Option<u16>,
}

#[derive(ClapArgs, Debug)]
pub struct ConvertArgs {
    /// Source file; reads stdin when omitted or `-`
    pub file: Option<PathBuf>,

    /// Source language (python, py, c++, cpp)
    #[arg(long = "from", short = 'f')]
    pub from: Language,

    /// Try Gemini first, falling back to basic conversion
    #[arg(long)]
    pub ai: bool,

    /// Print syntax-highlighted HTML instead of plain code
    #[arg(long)]
    pub html: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ValidateArgs {
    /// Source file; reads stdin when omitted or `-`
    pub file: Option<PathBuf>,

    /// Language to validate as (python, py, c++, cpp)
    #[arg(long, short = 'l')]
    pub lang: Language,
}

impl ServeArgs {
    /// Apply command-line overrides to the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

/// Load configuration honoring `--config-file`.
pub fn load_config(args: &Args) -> Result<AppConfig> {
    let config = match &args.config_file {
        Some(path) => AppConfig::load_file(path)?,
        None => AppConfig::load()?,
    };
    Ok(config)
}

pub async fn convert(args: ConvertArgs, config: &AppConfig) -> Result<ExitCode> {
    let code = read_source(args.file.as_deref()).await?;
    let converter = Converter::from_config(config);

    let outcome = converter
        .convert(ConvertRequest {
            source_language: args.from,
            code,
            use_ai: args.ai,
        })
        .await?;

    if let Some(warning) = &outcome.warning {
        eprintln!("warning: {}", warning);
    }
    if args.html {
        println!("{}", outcome.highlighted_html);
    } else {
        println!("{}", outcome.code);
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn validate_source(args: ValidateArgs) -> Result<ExitCode> {
    let verdict = check_source(&args).await?;
    if verdict.valid {
        println!("{}", verdict.message);
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{}", verdict.message);
        Ok(ExitCode::FAILURE)
    }
}

async fn check_source(args: &ValidateArgs) -> Result<Validation> {
    let code = read_source(args.file.as_deref()).await?;
    ensure_not_empty(&code)?;
    Ok(validate(&code, args.lang))
}

pub fn print_config(config: &AppConfig) -> Result<ExitCode> {
    print!("{}", config.to_toml()?);
    Ok(ExitCode::SUCCESS)
}

async fn read_source(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let args = Args::try_parse_from(["convertifier"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn test_convert_args() {
        let args =
            Args::try_parse_from(["convertifier", "convert", "in.cpp", "--from", "C++", "--ai"]).unwrap();
        match args.command {
            Some(Command::Convert(convert)) => {
                assert_eq!(convert.from, Language::Cpp);
                assert!(convert.ai);
                assert!(!convert.html);
                assert_eq!(convert.file.as_deref(), Some(Path::new("in.cpp")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_language_rejected() {
        assert!(Args::try_parse_from(["convertifier", "validate", "--lang", "rust"]).is_err());
    }

    #[test]
    fn test_serve_overrides() {
        let mut config = AppConfig::default();
        ServeArgs {
            host: Some("0.0.0.0".to_string()),
            port: Some(9000),
        }
        .apply(&mut config);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
    }

    #[tokio::test]
    async fn test_check_source_reads_file() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        write!(good, "int main() {{ return 0; }}").unwrap();
        let verdict = check_source(&ValidateArgs {
            file: Some(good.path().to_path_buf()),
            lang: Language::Cpp,
        })
        .await
        .unwrap();
        assert!(verdict.valid);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "def f(:\n").unwrap();
        let verdict = check_source(&ValidateArgs {
            file: Some(bad.path().to_path_buf()),
            lang: Language::Python,
        })
        .await
        .unwrap();
        assert!(!verdict.valid);
        assert!(verdict.message.starts_with("Invalid Python code:"));
    }

    #[tokio::test]
    async fn test_check_source_missing_file() {
        let result = check_source(&ValidateArgs {
            file: Some(PathBuf::from("/definitely/not/here.py")),
            lang: Language::Python,
        })
        .await;
        assert!(result.is_err());
    }
}
